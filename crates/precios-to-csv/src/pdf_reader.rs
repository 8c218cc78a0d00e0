use std::collections::BTreeMap;
use std::path::Path;

use encoding_rs::{UTF_16BE, WINDOWS_1252};
use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};

use crate::error::ConvertError;
use crate::model::{Edge, Orientation, PageLayout, TextFragment};

/// Average glyph advance as a fraction of the font size, used to move the
/// text cursor after a show operator when no font metrics are consulted.
const GLYPH_ADVANCE: f32 = 0.5;
const AXIS_SLOP: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl Matrix {
    const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    fn translate(tx: f32, ty: f32) -> Self {
        Self {
            e: tx,
            f: ty,
            ..Self::IDENTITY
        }
    }

    fn from_operands(operands: &[Object]) -> Option<Self> {
        let values = operands.iter().map(number).collect::<Option<Vec<_>>>()?;
        let [a, b, c, d, e, f] = values.as_slice() else {
            return None;
        };
        Some(Self {
            a: *a,
            b: *b,
            c: *c,
            d: *d,
            e: *e,
            f: *f,
        })
    }

    /// `self × other` in PDF row-vector convention.
    fn then(self, other: Self) -> Self {
        Self {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    fn apply(self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    fn vertical_scale(self) -> f32 {
        (self.b * self.b + self.d * self.d).sqrt()
    }
}

fn number(object: &Object) -> Option<f32> {
    match object {
        #[allow(clippy::cast_precision_loss)]
        Object::Integer(value) => Some(*value as f32),
        #[allow(clippy::cast_possible_truncation)]
        Object::Real(value) => Some(*value as f32),
        _ => None,
    }
}

fn looks_decoding_broken(text: &str) -> bool {
    if text.is_empty() {
        return false;
    }

    if text.contains("?Identity-H Unimplemented?") {
        return true;
    }

    let total = text.chars().count();
    let replacement = text.matches('\u{FFFD}').count();
    let control = text
        .chars()
        .filter(|ch| ch.is_control() && !matches!(ch, '\n' | '\r' | '\t'))
        .count();

    replacement * 8 > total || control * 5 > total
}

fn decode_pdf_bytes(encoding: Option<&str>, bytes: &[u8]) -> String {
    let decoded = Document::decode_text(encoding, bytes);
    if !looks_decoding_broken(&decoded) {
        return decoded;
    }

    if bytes.starts_with(&[0xFE, 0xFF]) {
        let (utf16, had_errors) = UTF_16BE.decode_without_bom_handling(&bytes[2..]);
        if !had_errors && !utf16.is_empty() {
            return utf16.into_owned();
        }
    }

    if let Some(name) = encoding {
        let lower = name.to_ascii_lowercase();
        if lower.contains("utf16")
            || lower.contains("ucs2")
            || lower.contains("identity-h")
            || lower.contains("unicode")
        {
            let (utf16, had_errors) = UTF_16BE.decode_without_bom_handling(bytes);
            if !had_errors && !utf16.is_empty() {
                return utf16.into_owned();
            }
        }
    }

    // Spanish survey fonts without a usable encoding entry are WinAnsi in practice.
    let (latin, _, _) = WINDOWS_1252.decode(bytes);
    latin.into_owned()
}

#[derive(Debug, Clone, Copy)]
struct TextState {
    matrix: Matrix,
    line_matrix: Matrix,
    leading: f32,
    font_size: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            matrix: Matrix::IDENTITY,
            line_matrix: Matrix::IDENTITY,
            leading: 0.0,
            font_size: 1.0,
        }
    }
}

impl TextState {
    fn move_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = Matrix::translate(tx, ty).then(self.line_matrix);
        self.matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.leading);
    }
}

/// Collects path segments until a painting operator commits them.
#[derive(Debug, Default)]
struct PathBuilder {
    current: Option<(f32, f32)>,
    subpath_start: Option<(f32, f32)>,
    segments: Vec<((f32, f32), (f32, f32))>,
}

impl PathBuilder {
    fn move_to(&mut self, point: (f32, f32)) {
        self.current = Some(point);
        self.subpath_start = Some(point);
    }

    fn line_to(&mut self, point: (f32, f32)) {
        if let Some(from) = self.current {
            self.segments.push((from, point));
        }
        self.current = Some(point);
    }

    fn close(&mut self) {
        if let (Some(from), Some(start)) = (self.current, self.subpath_start) {
            if from != start {
                self.segments.push((from, start));
            }
            self.current = Some(start);
        }
    }

    fn rectangle(&mut self, ctm: Matrix, x: f32, y: f32, width: f32, height: f32) {
        let corners = [
            ctm.apply(x, y),
            ctm.apply(x + width, y),
            ctm.apply(x + width, y + height),
            ctm.apply(x, y + height),
        ];
        self.move_to(corners[0]);
        for corner in &corners[1..] {
            self.line_to(*corner);
        }
        self.close();
    }

    fn take_segments(&mut self) -> Vec<((f32, f32), (f32, f32))> {
        self.current = None;
        self.subpath_start = None;
        std::mem::take(&mut self.segments)
    }
}

fn segment_to_edge(from: (f32, f32), to: (f32, f32)) -> Option<Edge> {
    let (x0, y0) = from;
    let (x1, y1) = to;
    if (y0 - y1).abs() <= AXIS_SLOP {
        return Some(Edge {
            orientation: Orientation::Horizontal,
            position: (y0 + y1) / 2.0,
            start: x0.min(x1),
            end: x0.max(x1),
        });
    }
    if (x0 - x1).abs() <= AXIS_SLOP {
        return Some(Edge {
            orientation: Orientation::Vertical,
            position: (x0 + x1) / 2.0,
            start: y0.min(y1),
            end: y0.max(y1),
        });
    }
    None
}

fn shown_text(encoding: Option<&str>, operands: &[Object]) -> String {
    fn collect(text: &mut String, encoding: Option<&str>, operands: &[Object]) {
        for operand in operands {
            match operand {
                Object::String(bytes, _) => text.push_str(&decode_pdf_bytes(encoding, bytes)),
                Object::Array(items) => collect(text, encoding, items),
                Object::Integer(value) if *value < -100 => text.push(' '),
                #[allow(clippy::cast_possible_truncation)]
                Object::Real(value) if (*value as f32) < -100.0 => text.push(' '),
                _ => {}
            }
        }
    }

    let mut text = String::new();
    collect(&mut text, encoding, operands);
    text
}

/// Interprets one page's content stream into positioned text fragments and
/// ruling-line edges.
pub(crate) fn read_page_layout(
    document: &Document,
    page_number: u32,
    page_id: ObjectId,
) -> Result<PageLayout, ConvertError> {
    let raw_content = document.get_page_content(page_id)?;
    let content = Content::decode(&raw_content)?;
    let encodings = document
        .get_page_fonts(page_id)
        .into_iter()
        .map(|(name, font)| (name, font.get_font_encoding()))
        .collect::<BTreeMap<Vec<u8>, &str>>();

    let mut layout = PageLayout {
        page_number,
        ..PageLayout::default()
    };
    let mut ctm = Matrix::IDENTITY;
    let mut saved = Vec::new();
    let mut text_state = TextState::default();
    let mut encoding = None;
    let mut path = PathBuilder::default();

    for operation in &content.operations {
        let operands = operation.operands.as_slice();
        match operation.operator.as_str() {
            "q" => saved.push(ctm),
            "Q" => ctm = saved.pop().unwrap_or(Matrix::IDENTITY),
            "cm" => {
                if let Some(matrix) = Matrix::from_operands(operands) {
                    ctm = matrix.then(ctm);
                }
            }
            "BT" => {
                text_state.matrix = Matrix::IDENTITY;
                text_state.line_matrix = Matrix::IDENTITY;
            }
            "Tf" => {
                if let Some(font_name) = operands
                    .first()
                    .and_then(|operand| operand.as_name().ok())
                {
                    encoding = encodings.get(font_name).copied();
                }
                if let Some(size) = operands.get(1).and_then(number) {
                    text_state.font_size = size;
                }
            }
            "TL" => {
                if let Some(leading) = operands.first().and_then(number) {
                    text_state.leading = leading;
                }
            }
            "Td" | "TD" => {
                if let (Some(tx), Some(ty)) = (
                    operands.first().and_then(number),
                    operands.get(1).and_then(number),
                ) {
                    if operation.operator == "TD" {
                        text_state.leading = -ty;
                    }
                    text_state.move_line(tx, ty);
                }
            }
            "Tm" => {
                if let Some(matrix) = Matrix::from_operands(operands) {
                    text_state.matrix = matrix;
                    text_state.line_matrix = matrix;
                }
            }
            "T*" => text_state.next_line(),
            "Tj" | "TJ" | "'" | "\"" => {
                if operation.operator != "Tj" && operation.operator != "TJ" {
                    text_state.next_line();
                }
                let shown = match operation.operator.as_str() {
                    "\"" => operands.get(2..).unwrap_or_default(),
                    _ => operands,
                };
                let text = shown_text(encoding, shown);
                push_fragment(&mut layout, &mut text_state, ctm, text);
            }
            "m" => {
                if let (Some(x), Some(y)) = (
                    operands.first().and_then(number),
                    operands.get(1).and_then(number),
                ) {
                    path.move_to(ctm.apply(x, y));
                }
            }
            "l" => {
                if let (Some(x), Some(y)) = (
                    operands.first().and_then(number),
                    operands.get(1).and_then(number),
                ) {
                    path.line_to(ctm.apply(x, y));
                }
            }
            "c" | "v" | "y" => {
                let values = operands.iter().filter_map(number).collect::<Vec<_>>();
                if let [.., x, y] = values.as_slice() {
                    path.current = Some(ctm.apply(*x, *y));
                }
            }
            "re" => {
                let values = operands.iter().filter_map(number).collect::<Vec<_>>();
                if let [x, y, width, height] = values.as_slice() {
                    path.rectangle(ctm, *x, *y, *width, *height);
                }
            }
            "h" => path.close(),
            "S" | "s" | "f" | "F" | "f*" | "B" | "B*" | "b" | "b*" => {
                if matches!(operation.operator.as_str(), "s" | "b" | "b*") {
                    path.close();
                }
                layout.edges.extend(
                    path.take_segments()
                        .into_iter()
                        .filter_map(|(from, to)| segment_to_edge(from, to)),
                );
            }
            "n" => {
                path.take_segments();
            }
            _ => {}
        }
    }

    Ok(layout)
}

fn push_fragment(layout: &mut PageLayout, state: &mut TextState, ctm: Matrix, text: String) {
    let rendering = state.matrix.then(ctm);
    let (x, y) = rendering.apply(0.0, 0.0);
    let size = state.font_size * rendering.vertical_scale();

    #[allow(clippy::cast_precision_loss)]
    let advance = text.chars().count() as f32 * state.font_size * GLYPH_ADVANCE;
    state.matrix = Matrix::translate(advance, 0.0).then(state.matrix);

    if text.trim().is_empty() {
        return;
    }
    layout.fragments.push(TextFragment { text, x, y, size });
}

pub(crate) fn load_document(input_pdf: &Path) -> Result<Document, ConvertError> {
    Ok(Document::load(input_pdf)?)
}

pub(crate) fn load_document_from_bytes(input_pdf: &[u8]) -> Result<Document, ConvertError> {
    Ok(Document::load_mem(input_pdf)?)
}
