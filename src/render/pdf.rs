//! Single-page vector PDF output for plotters.
//!
//! Drawing calls are recorded into one content stream; nothing touches the
//! filesystem until [`DrawingBackend::present`], which assembles the document
//! in memory and writes it with a single call. Text uses the standard
//! Helvetica Type1 font, so no font files are embedded or looked up.

use std::path::{Path, PathBuf};

use pdf_writer::types::{LineCapStyle, LineJoinStyle};
use pdf_writer::{Content, Finish, Name, Pdf, Rect, Ref, Str};
use plotters_backend::text_anchor::{HPos, Pos, VPos};
use plotters_backend::{
    BackendColor, BackendCoord, BackendStyle, BackendTextStyle, DrawingBackend, DrawingErrorKind,
    FontTransform,
};
use thiserror::Error;

const FONT: &[u8] = b"F1";

/// Helvetica ascender and descender, as fractions of the font size.
const ASCENT: f32 = 0.72;
const DESCENT: f32 = 0.21;

/// Bézier handle length for a quarter circle.
const KAPPA: f32 = 0.552_284_8;

/// Helvetica advance widths (1/1000 em) for ASCII 32..=126.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0..9
    278, 278, 584, 584, 584, 556, 1015, // :..@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A..M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N..Z
    278, 278, 278, 469, 556, 333, // [..`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a..m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n..z
    334, 260, 334, 584, // {..~
];

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("writing PDF: {0}")]
    Io(#[from] std::io::Error),
}

/// A plotters backend producing a one-page PDF at `target`.
pub struct PdfBackend {
    target: PathBuf,
    size: (u32, u32),
    content: Content,
    /// Opacities (per mille) in ExtGState order; `GS{i}` names entry `i`.
    alphas: Vec<u16>,
    saved: bool,
}

impl PdfBackend {
    /// Page size is given in PDF points.
    pub fn new<P: AsRef<Path> + ?Sized>(target: &P, size: (u32, u32)) -> Self {
        PdfBackend {
            target: target.as_ref().to_path_buf(),
            size,
            content: Content::new(),
            alphas: Vec::new(),
            saved: false,
        }
    }

    /// Flip from the backend's y-down coordinates to PDF user space.
    fn pt(&self, (x, y): BackendCoord) -> (f32, f32) {
        (x as f32, self.size.1 as f32 - y as f32)
    }

    fn ext_state(&mut self, alpha: f64) -> String {
        let key = (alpha.clamp(0.0, 1.0) * 1000.0).round() as u16;
        let idx = match self.alphas.iter().position(|&a| a == key) {
            Some(idx) => idx,
            None => {
                self.alphas.push(key);
                self.alphas.len() - 1
            }
        };
        format!("GS{idx}")
    }

    /// Open a graphics state painting in `color`. Strokes when `stroke_width`
    /// is given, fills otherwise. Returns `false` for invisible colours, in
    /// which case nothing was opened.
    fn begin(&mut self, color: BackendColor, stroke_width: Option<u32>) -> bool {
        if color.alpha <= 0.0 {
            return false;
        }
        self.content.save_state();
        if color.alpha < 1.0 {
            let name = self.ext_state(color.alpha);
            self.content.set_parameters(Name(name.as_bytes()));
        }
        let (r, g, b) = color.rgb;
        let (r, g, b) = (r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
        match stroke_width {
            Some(width) => {
                self.content
                    .set_stroke_rgb(r, g, b)
                    .set_line_width(width as f32)
                    .set_line_cap(LineCapStyle::RoundCap)
                    .set_line_join(LineJoinStyle::RoundJoin);
            }
            None => {
                self.content.set_fill_rgb(r, g, b);
            }
        }
        true
    }

    fn end(&mut self) {
        self.content.restore_state();
    }

    fn trace<I: IntoIterator<Item = BackendCoord>>(&mut self, points: I) -> usize {
        let mut count = 0;
        for p in points {
            let (x, y) = self.pt(p);
            if count == 0 {
                self.content.move_to(x, y);
            } else {
                self.content.line_to(x, y);
            }
            count += 1;
        }
        count
    }

    /// Assemble the complete document.
    fn render_document(&mut self) -> Vec<u8> {
        let catalog_id = Ref::new(1);
        let page_tree_id = Ref::new(2);
        let page_id = Ref::new(3);
        let content_id = Ref::new(4);
        let font_id = Ref::new(5);
        let first_state = 6;

        let (w, h) = (self.size.0 as f32, self.size.1 as f32);
        let mut pdf = Pdf::new();
        pdf.catalog(catalog_id).pages(page_tree_id);
        pdf.pages(page_tree_id).kids([page_id]).count(1);

        {
            let mut page = pdf.page(page_id);
            page.media_box(Rect::new(0.0, 0.0, w, h));
            page.parent(page_tree_id);
            page.contents(content_id);
            let mut resources = page.resources();
            resources.fonts().pair(Name(FONT), font_id);
            if !self.alphas.is_empty() {
                let mut states = resources.ext_g_states();
                for i in 0..self.alphas.len() {
                    states.pair(
                        Name(format!("GS{i}").as_bytes()),
                        Ref::new(first_state + i as i32),
                    );
                }
                states.finish();
            }
            resources.finish();
            page.finish();
        }

        pdf.type1_font(font_id)
            .base_font(Name(b"Helvetica"))
            .encoding_predefined(Name(b"WinAnsiEncoding"));

        for (i, &alpha) in self.alphas.iter().enumerate() {
            let alpha = alpha as f32 / 1000.0;
            pdf.ext_graphics(Ref::new(first_state + i as i32))
                .non_stroking_alpha(alpha)
                .stroking_alpha(alpha);
        }

        let content = std::mem::replace(&mut self.content, Content::new());
        pdf.stream(content_id, &content.finish());
        pdf.finish()
    }
}

/// Width of `text` set in Helvetica at `size` points.
pub fn text_width(text: &str, size: f32) -> f32 {
    let units: u32 = text
        .chars()
        .map(|c| match c as u32 {
            cp @ 32..=126 => HELVETICA_WIDTHS[(cp - 32) as usize] as u32,
            _ => 556,
        })
        .sum();
    units as f32 * size / 1000.0
}

/// Encode text for a WinAnsi font. Unrepresentable characters become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .filter(|c| !c.is_control())
        .map(|c| match c as u32 {
            cp @ (0x20..=0x7e | 0xa0..=0xff) => cp as u8,
            0x20ac => 0x80, // €
            0x2022 => 0x95, // •
            0x2013 => 0x96, // –
            0x2014 => 0x97, // —
            _ => b'?',
        })
        .collect()
}

/// Offset of the baseline origin from a text anchor, in the text's own
/// y-up frame. The text box spans `DESCENT` below to `ASCENT` above the
/// baseline.
fn baseline_offset(anchor: Pos, width: f32, size: f32) -> (f32, f32) {
    let dx = match anchor.h_pos {
        HPos::Left => 0.0,
        HPos::Center => -width / 2.0,
        HPos::Right => -width,
    };
    let dy = match anchor.v_pos {
        VPos::Top => -ASCENT * size,
        VPos::Center => (DESCENT - ASCENT) * size / 2.0,
        VPos::Bottom => DESCENT * size,
    };
    (dx, dy)
}

impl DrawingBackend for PdfBackend {
    type ErrorType = PdfError;

    fn get_size(&self) -> (u32, u32) {
        self.size
    }

    fn ensure_prepared(&mut self) -> Result<(), DrawingErrorKind<PdfError>> {
        Ok(())
    }

    fn present(&mut self) -> Result<(), DrawingErrorKind<PdfError>> {
        if self.saved {
            return Ok(());
        }
        let bytes = self.render_document();
        std::fs::write(&self.target, bytes)
            .map_err(|e| DrawingErrorKind::DrawingError(PdfError::Io(e)))?;
        self.saved = true;
        Ok(())
    }

    fn draw_pixel(
        &mut self,
        point: BackendCoord,
        color: BackendColor,
    ) -> Result<(), DrawingErrorKind<PdfError>> {
        if self.begin(color, None) {
            let (x, y) = self.pt(point);
            self.content.rect(x, y - 1.0, 1.0, 1.0).fill_nonzero();
            self.end();
        }
        Ok(())
    }

    fn draw_line<S: BackendStyle>(
        &mut self,
        from: BackendCoord,
        to: BackendCoord,
        style: &S,
    ) -> Result<(), DrawingErrorKind<PdfError>> {
        if self.begin(style.color(), Some(style.stroke_width())) {
            self.trace([from, to]);
            self.content.stroke();
            self.end();
        }
        Ok(())
    }

    fn draw_rect<S: BackendStyle>(
        &mut self,
        upper_left: BackendCoord,
        bottom_right: BackendCoord,
        style: &S,
        fill: bool,
    ) -> Result<(), DrawingErrorKind<PdfError>> {
        let stroke = if fill { None } else { Some(style.stroke_width()) };
        if self.begin(style.color(), stroke) {
            let (x0, y0) = self.pt(upper_left);
            let (x1, y1) = self.pt(bottom_right);
            self.content.rect(x0, y1, x1 - x0, y0 - y1);
            if fill {
                self.content.fill_nonzero();
            } else {
                self.content.stroke();
            }
            self.end();
        }
        Ok(())
    }

    fn draw_path<S: BackendStyle, I: IntoIterator<Item = BackendCoord>>(
        &mut self,
        path: I,
        style: &S,
    ) -> Result<(), DrawingErrorKind<PdfError>> {
        if self.begin(style.color(), Some(style.stroke_width())) {
            if self.trace(path) > 1 {
                self.content.stroke();
            } else {
                self.content.end_path();
            }
            self.end();
        }
        Ok(())
    }

    fn draw_circle<S: BackendStyle>(
        &mut self,
        center: BackendCoord,
        radius: u32,
        style: &S,
        fill: bool,
    ) -> Result<(), DrawingErrorKind<PdfError>> {
        let stroke = if fill { None } else { Some(style.stroke_width()) };
        if self.begin(style.color(), stroke) {
            let (cx, cy) = self.pt(center);
            let r = radius as f32;
            let k = r * KAPPA;
            self.content
                .move_to(cx + r, cy)
                .cubic_to(cx + r, cy + k, cx + k, cy + r, cx, cy + r)
                .cubic_to(cx - k, cy + r, cx - r, cy + k, cx - r, cy)
                .cubic_to(cx - r, cy - k, cx - k, cy - r, cx, cy - r)
                .cubic_to(cx + k, cy - r, cx + r, cy - k, cx + r, cy)
                .close_path();
            if fill {
                self.content.fill_nonzero();
            } else {
                self.content.stroke();
            }
            self.end();
        }
        Ok(())
    }

    fn fill_polygon<S: BackendStyle, I: IntoIterator<Item = BackendCoord>>(
        &mut self,
        vert: I,
        style: &S,
    ) -> Result<(), DrawingErrorKind<PdfError>> {
        if self.begin(style.color(), None) {
            if self.trace(vert) > 2 {
                self.content.close_path().fill_nonzero();
            } else {
                self.content.end_path();
            }
            self.end();
        }
        Ok(())
    }

    fn draw_text<TStyle: BackendTextStyle>(
        &mut self,
        text: &str,
        style: &TStyle,
        pos: BackendCoord,
    ) -> Result<(), DrawingErrorKind<PdfError>> {
        if text.is_empty() || !self.begin(style.color(), None) {
            return Ok(());
        }
        let size = style.size() as f32;
        let width = text_width(text, size);
        let (dx, dy) = baseline_offset(style.anchor(), width, size);
        // counter-clockwise rotation in PDF space
        let (cos, sin) = match style.transform() {
            FontTransform::None => (1.0, 0.0),
            FontTransform::Rotate90 => (0.0, -1.0),
            FontTransform::Rotate180 => (-1.0, 0.0),
            FontTransform::Rotate270 => (0.0, 1.0),
        };
        let (px, py) = self.pt(pos);
        let x = px + dx * cos - dy * sin;
        let y = py + dx * sin + dy * cos;

        let encoded = encode_win_ansi(text);
        self.content
            .begin_text()
            .set_font(Name(FONT), size)
            .set_text_matrix([cos, sin, -sin, cos, x, y])
            .show(Str(&encoded))
            .end_text();
        self.end();
        Ok(())
    }

    fn estimate_text_size<TStyle: BackendTextStyle>(
        &self,
        text: &str,
        style: &TStyle,
    ) -> Result<(u32, u32), DrawingErrorKind<PdfError>> {
        let size = style.size() as f32;
        Ok((
            text_width(text, size).ceil() as u32,
            ((ASCENT + DESCENT) * size).ceil() as u32,
        ))
    }
}
