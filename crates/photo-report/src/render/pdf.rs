use crate::constants::{CAPTION_BASELINE_FACTOR, caption_width_mm, mm_to_pt, pt_to_mm};
use crate::source::decode_rgb;
use crate::types::{Rect, ReportError, Result, TextAlign};
use printpdf::{
    BuiltinFont, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, Pt, RawImage, RawImageData,
    RawImageFormat, TextItem, TextMatrix, XObjectId, XObjectTransform,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::DocumentSink;

/// Resolution printpdf assumes when sizing an embedded image
const IMAGE_DPI: f32 = 300.0;

struct PageBuffer {
    width_mm: f32,
    height_mm: f32,
    ops: Vec<Op>,
}

/// [`DocumentSink`] that builds a PDF in memory with printpdf
pub struct PdfSink {
    doc: PdfDocument,
    pages: Vec<PdfPage>,
    current: Option<PageBuffer>,
    /// Images already embedded, so the letterhead is stored once
    images: HashMap<PathBuf, (XObjectId, usize, usize)>,
    page_total: usize,
    finalized: bool,
}

impl PdfSink {
    pub fn new(title: &str) -> Self {
        Self {
            doc: PdfDocument::new(title),
            pages: Vec::new(),
            current: None,
            images: HashMap::new(),
            page_total: 0,
            finalized: false,
        }
    }

    fn current_page(&mut self) -> Result<&mut PageBuffer> {
        self.current
            .as_mut()
            .ok_or_else(|| ReportError::Pdf("Draw command issued before the first page".to_string()))
    }

    fn embed_image(&mut self, path: &Path) -> Result<(XObjectId, usize, usize)> {
        if let Some(embedded) = self.images.get(path) {
            return Ok(embedded.clone());
        }

        let rgb = decode_rgb(path)?;
        let (width, height) = (rgb.width() as usize, rgb.height() as usize);
        let raw = RawImage {
            pixels: RawImageData::U8(rgb.into_raw()),
            width,
            height,
            data_format: RawImageFormat::RGB8,
            tag: Vec::new(),
        };
        let id = self.doc.add_image(&raw);

        self.images
            .insert(path.to_path_buf(), (id.clone(), width, height));
        Ok((id, width, height))
    }

    fn flush_page(&mut self) {
        if let Some(page) = self.current.take() {
            self.pages.push(PdfPage::new(
                Mm(page.width_mm),
                Mm(page.height_mm),
                page.ops,
            ));
        }
    }
}

impl DocumentSink for PdfSink {
    fn new_page(&mut self, width_mm: f32, height_mm: f32) -> Result<()> {
        if self.finalized {
            return Err(ReportError::Pdf("Document already finalized".to_string()));
        }
        self.flush_page();
        self.current = Some(PageBuffer {
            width_mm,
            height_mm,
            ops: Vec::new(),
        });
        self.page_total += 1;
        Ok(())
    }

    fn place_image(&mut self, path: &Path, rect: Rect) -> Result<()> {
        self.current_page()?;
        let (id, width_px, height_px) = self.embed_image(path)?;
        let page = self.current_page()?;

        // Natural size at IMAGE_DPI, scaled to the requested box
        let natural_width_pt = width_px as f32 * 72.0 / IMAGE_DPI;
        let natural_height_pt = height_px as f32 * 72.0 / IMAGE_DPI;
        let bottom_mm = page.height_mm - rect.bottom();

        page.ops.push(Op::UseXobject {
            id,
            transform: XObjectTransform {
                translate_x: Some(Pt(mm_to_pt(rect.x))),
                translate_y: Some(Pt(mm_to_pt(bottom_mm))),
                scale_x: Some(mm_to_pt(rect.width) / natural_width_pt),
                scale_y: Some(mm_to_pt(rect.height) / natural_height_pt),
                dpi: Some(IMAGE_DPI),
                ..Default::default()
            },
        });
        Ok(())
    }

    fn place_text(
        &mut self,
        text: &str,
        area: Rect,
        font_size_pt: f32,
        align: TextAlign,
    ) -> Result<()> {
        let page = self.current_page()?;

        let text_width = caption_width_mm(text, font_size_pt);
        let x = match align {
            TextAlign::Left => area.x,
            TextAlign::Center => area.center_x() - text_width / 2.0,
            TextAlign::Right => area.right() - text_width,
        };
        let baseline = area.center_y() + CAPTION_BASELINE_FACTOR * pt_to_mm(font_size_pt);
        let y = page.height_mm - baseline;

        page.ops.push(Op::StartTextSection);
        page.ops.push(Op::SetFontSizeBuiltinFont {
            font: BuiltinFont::HelveticaBold,
            size: Pt(font_size_pt),
        });
        page.ops.push(Op::SetTextMatrix {
            matrix: TextMatrix::Translate(Mm(x).into_pt(), Mm(y).into_pt()),
        });
        page.ops.push(Op::WriteTextBuiltinFont {
            items: vec![TextItem::Text(text.to_string())],
            font: BuiltinFont::HelveticaBold,
        });
        page.ops.push(Op::EndTextSection);
        Ok(())
    }

    fn finalize(&mut self, output_path: &Path) -> Result<()> {
        if self.finalized {
            return Err(ReportError::Pdf("Document already finalized".to_string()));
        }
        self.flush_page();
        if self.pages.is_empty() {
            return Err(ReportError::Pdf("Document has no pages".to_string()));
        }

        self.doc.pages = std::mem::take(&mut self.pages);
        let mut warnings = Vec::new();
        let bytes = self.doc.save(&PdfSaveOptions::default(), &mut warnings);
        for warning in &warnings {
            log::debug!("PDF warning: {:?}", warning);
        }

        // Write next to the target, then rename into place
        let file_name = output_path
            .file_name()
            .ok_or_else(|| {
                ReportError::Config(format!("Invalid output path {}", output_path.display()))
            })?
            .to_string_lossy();
        let partial = output_path.with_file_name(format!(".{file_name}.part"));
        std::fs::write(&partial, bytes)?;
        if let Err(e) = std::fs::rename(&partial, output_path) {
            let _ = std::fs::remove_file(&partial);
            return Err(e.into());
        }

        self.finalized = true;
        Ok(())
    }

    fn page_count(&self) -> usize {
        self.page_total
    }
}
