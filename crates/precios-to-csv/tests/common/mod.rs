use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

pub const COLUMN_WIDTH: i64 = 110;
pub const ROW_HEIGHT: i64 = 20;

/// A fully ruled table whose top-left corner sits at (`left`, `top`).
pub struct RuledTable<'a> {
    pub left: i64,
    pub top: i64,
    pub rows: &'a [&'a [&'a str]],
}

impl RuledTable<'_> {
    fn operations(&self) -> Vec<Operation> {
        let columns = self.rows.iter().map(|row| row.len()).max().unwrap_or(0);
        let width = COLUMN_WIDTH * i64::try_from(columns).unwrap_or(0);
        let height = ROW_HEIGHT * i64::try_from(self.rows.len()).unwrap_or(0);
        let bottom = self.top - height;
        let right = self.left + width;

        let mut operations = vec![Operation::new("w", vec![1.into()])];
        let mut line = |from: (i64, i64), to: (i64, i64)| {
            operations.push(Operation::new("m", vec![from.0.into(), from.1.into()]));
            operations.push(Operation::new("l", vec![to.0.into(), to.1.into()]));
            operations.push(Operation::new("S", vec![]));
        };

        for row in 0..=self.rows.len() {
            let y = self.top - ROW_HEIGHT * i64::try_from(row).unwrap_or(0);
            line((self.left, y), (right, y));
        }
        for column in 0..=columns {
            let x = self.left + COLUMN_WIDTH * i64::try_from(column).unwrap_or(0);
            line((x, self.top), (x, bottom));
        }

        for (row_index, row) in self.rows.iter().enumerate() {
            let baseline = self.top - ROW_HEIGHT * i64::try_from(row_index + 1).unwrap_or(0) + 6;
            for (column_index, cell) in row.iter().enumerate() {
                if cell.is_empty() {
                    continue;
                }
                let x = self.left + COLUMN_WIDTH * i64::try_from(column_index).unwrap_or(0) + 3;
                operations.extend([
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 9.into()]),
                    Operation::new("Td", vec![x.into(), baseline.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*cell)]),
                    Operation::new("ET", vec![]),
                ]);
            }
        }

        operations
    }
}

/// One page: ruled tables plus free-standing text lines above them.
pub struct FixturePage<'a> {
    pub text: &'a [&'a str],
    pub tables: &'a [RuledTable<'a>],
}

pub fn create_survey_pdf(
    path: &Path,
    pages: &[FixturePage<'_>],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut doc = Document::with_version("1.5");

    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut page_ids = Vec::new();

    for page in pages {
        let mut operations = Vec::new();
        if !page.text.is_empty() {
            operations.extend([
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("TL", vec![16.into()]),
                Operation::new("Td", vec![50.into(), 560.into()]),
            ]);
            for (index, line) in page.text.iter().enumerate() {
                operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
                if index + 1 < page.text.len() {
                    operations.push(Operation::new("T*", vec![]));
                }
            }
            operations.push(Operation::new("ET", vec![]));
        }
        for table in page.tables {
            operations.extend(table.operations());
        }

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Resources" => resources_id,
            "Contents" => content_id,
        });
        page_ids.push(page_id);
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids.iter().map(|id| (*id).into()).collect::<Vec<_>>(),
            "Count" => i64::try_from(page_ids.len())?,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 842.into(), 595.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    doc.save(path)?;
    Ok(())
}
