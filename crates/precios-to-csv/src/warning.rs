#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningCode {
    UnreadablePageContent,
    NoTablesDetected,
    HeaderOnlyPage,
    TooFewRows,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertWarning {
    pub code: WarningCode,
    pub message: String,
    pub page: Option<u32>,
}

impl ConvertWarning {
    #[must_use]
    pub fn new(code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            page: None,
        }
    }

    #[must_use]
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }
}
