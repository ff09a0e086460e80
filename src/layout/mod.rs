//! # Page-Native Pagination
//!
//! Blocks are placed straight onto pages of known size. There is no tall
//! canvas that gets sliced afterwards. The loop is:
//!
//! 1. Open a page with known content bounds (and draw the running header)
//! 2. Before placing a block, ask: "does this fit below the cursor?"
//! 3. If it fits: draw it at the cursor, advance by its height plus spacing
//! 4. If it doesn't fit: open a new page and draw it there
//! 5. Tables are the only block that splits. Rows that fit are drawn, the
//!    rest continue on a new page under a re-drawn header row
//! 6. A block taller than a whole empty page is drawn anyway, clipped to the
//!    content area, so pagination always terminates
//!
//! Every renderer measures before it draws, and the height it reports is the
//! height it draws. The paginator trusts that and never observes overflow
//! after the fact.

pub mod image;
pub mod page_break;
pub mod table;
pub mod text_box;

use std::sync::Arc;

use log::{debug, warn};
use serde::Serialize;

use crate::config::ReportConfig;
use crate::fetch::ImageSet;
use crate::font::StandardFont;
use crate::image_loader::LoadedImage;
use crate::model::{Block, Color, HeadingBlock, HeadingLevel, TableBlock};
use page_break::{decide_block, decide_split, BreakDecision};

/// Helvetica cap height as a fraction of the font size.
const CAP_HEIGHT: f64 = 0.718;

/// A fully laid-out page ready for stamping and PDF serialization.
#[derive(Debug, Clone)]
pub struct LayoutPage {
    pub index: usize,
    pub width: f64,
    pub height: f64,
    pub content_top: f64,
    pub content_bottom: f64,
    /// Content drawn by the pagination pass.
    pub elements: Vec<LayoutElement>,
    /// What was placed on this page, in order.
    pub placements: Vec<Placement>,
    /// Footer band elements. Owned by the stamper, which replaces them wholesale.
    pub footer: Vec<LayoutElement>,
}

/// A positioned element on a page.
#[derive(Debug, Clone)]
pub struct LayoutElement {
    /// Absolute position on the page (top-left corner, y grows downward).
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub draw: DrawCommand,
    /// Only used by [`DrawCommand::Clip`].
    pub children: Vec<LayoutElement>,
}

/// What to actually draw for an element.
#[derive(Debug, Clone)]
pub enum DrawCommand {
    /// A filled and/or stroked rectangle covering the element bounds.
    Rect {
        fill: Option<Color>,
        stroke: Option<Stroke>,
    },
    /// A single line of text. `baseline` is an absolute page y.
    Text {
        text: String,
        font: StandardFont,
        size: f64,
        color: Color,
        baseline: f64,
    },
    /// A raster image scaled into the element bounds.
    Image { image: Arc<LoadedImage> },
    /// Draw `children` clipped to the element bounds.
    Clip,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Color,
    pub width: f64,
}

impl LayoutElement {
    pub fn rect(
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        fill: Option<Color>,
        stroke: Option<Stroke>,
    ) -> Self {
        Self {
            x,
            y,
            width,
            height,
            draw: DrawCommand::Rect { fill, stroke },
            children: Vec::new(),
        }
    }

    /// One line of text, vertically centred in a box `box_height` tall.
    pub fn text(
        x: f64,
        y: f64,
        box_height: f64,
        text: String,
        font: StandardFont,
        size: f64,
        color: Color,
    ) -> Self {
        let width = font.measure(&text, size);
        let baseline = y + (box_height + size * CAP_HEIGHT) / 2.0;
        Self {
            x,
            y,
            width,
            height: box_height,
            draw: DrawCommand::Text {
                text,
                font,
                size,
                color,
                baseline,
            },
            children: Vec::new(),
        }
    }

    /// Text centred horizontally within `[left, left + span]`.
    #[allow(clippy::too_many_arguments)]
    pub fn centered_text(
        left: f64,
        span: f64,
        y: f64,
        box_height: f64,
        text: String,
        font: StandardFont,
        size: f64,
        color: Color,
    ) -> Self {
        let mut el = Self::text(left, y, box_height, text, font, size, color);
        el.x = left + (span - el.width) / 2.0;
        el
    }

    pub fn clip(x: f64, y: f64, width: f64, height: f64, children: Vec<LayoutElement>) -> Self {
        Self {
            x,
            y,
            width,
            height,
            draw: DrawCommand::Clip,
            children,
        }
    }
}

// ── Placements and the serializable summary ─────────────────────

/// One block (or one table segment) as placed on a page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub kind: &'static str,
    pub label: String,
    pub page_index: usize,
    pub y: f64,
    pub height: f64,
    /// True for table segments after the first.
    pub continued: bool,
    /// True when the block exceeded the content area and was clipped.
    pub clipped: bool,
}

/// Per-page placement listing for a finished layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSummary {
    pub page_count: usize,
    pub pages: Vec<PageSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSummary {
    pub index: usize,
    pub placements: Vec<Placement>,
}

impl LayoutSummary {
    pub fn from_pages(pages: &[LayoutPage]) -> Self {
        Self {
            page_count: pages.len(),
            pages: pages
                .iter()
                .map(|p| PageSummary {
                    index: p.index,
                    placements: p.placements.clone(),
                })
                .collect(),
        }
    }
}

// ── Page state ──────────────────────────────────────────────────

/// Where we are on the current page. Owned by one [`Paginator`].
#[derive(Debug, Clone, PartialEq)]
pub struct PageState {
    pub page_index: usize,
    pub cursor_y: f64,
    pub content_top: f64,
    pub content_bottom: f64,
    pub content_left: f64,
    pub content_width: f64,
}

impl PageState {
    fn first(config: &ReportConfig) -> Self {
        let (page_w, page_h) = config.page.size.dimensions();
        let margin = &config.page.margin;
        let content_top = margin.top + config.page_header_height();
        Self {
            page_index: 0,
            cursor_y: content_top,
            content_top,
            content_bottom: page_h - margin.bottom,
            content_left: margin.left,
            content_width: page_w - margin.horizontal(),
        }
    }

    fn next_page(&self) -> Self {
        Self {
            page_index: self.page_index + 1,
            cursor_y: self.content_top,
            ..self.clone()
        }
    }

    pub fn remaining_height(&self) -> f64 {
        (self.content_bottom - self.cursor_y).max(0.0)
    }

    pub fn content_height(&self) -> f64 {
        self.content_bottom - self.content_top
    }

    /// Nothing has been placed since the page opened.
    pub fn is_empty(&self) -> bool {
        self.cursor_y <= self.content_top
    }
}

// ── Paginator ───────────────────────────────────────────────────

/// Sequences blocks onto pages. One instance per document render.
pub struct Paginator<'a> {
    config: &'a ReportConfig,
    images: &'a ImageSet,
    page_width: f64,
    page_height: f64,
    state: PageState,
    elements: Vec<LayoutElement>,
    placements: Vec<Placement>,
    pages: Vec<LayoutPage>,
}

impl<'a> Paginator<'a> {
    /// Open the first page.
    pub fn new(config: &'a ReportConfig, images: &'a ImageSet) -> Self {
        let (page_width, page_height) = config.page.size.dimensions();
        let mut paginator = Self {
            config,
            images,
            page_width,
            page_height,
            state: PageState::first(config),
            elements: Vec::new(),
            placements: Vec::new(),
            pages: Vec::new(),
        };
        paginator.draw_page_header();
        paginator
    }

    pub fn state(&self) -> &PageState {
        &self.state
    }

    /// Place every block in order, keeping each heading on the same page as
    /// the block that follows it.
    pub fn place_sequence(&mut self, blocks: &[Block]) {
        for (i, block) in blocks.iter().enumerate() {
            if let (Block::Heading(_), Some(next)) = (block, blocks.get(i + 1)) {
                if !matches!(next, Block::PageBreak) {
                    let together = self.required_height(block)
                        + self.config.block_spacing
                        + self.leading_height(next);
                    if together <= self.state.content_height()
                        && decide_block(self.state.remaining_height(), together, self.state.is_empty())
                            == BreakDecision::MoveToNextPage
                    {
                        debug!("Keeping heading '{}' with the next block", block.label());
                        self.new_page();
                    }
                }
            }
            self.place(block);
        }
    }

    /// Place a single block at the cursor, opening a new page first when it
    /// does not fit.
    pub fn place(&mut self, block: &Block) {
        match block {
            Block::PageBreak => self.force_page_break(),
            Block::Table(table) => self.place_table(table),
            _ => self.place_unbreakable(block),
        }
    }

    /// Start a new page regardless of remaining space.
    pub fn force_page_break(&mut self) {
        debug!("Forced page break after page {}", self.state.page_index + 1);
        self.new_page();
    }

    /// Close the last page and hand over the finished page set.
    pub fn finish(mut self) -> Vec<LayoutPage> {
        self.close_page();
        self.pages
    }

    /// Height a block needs, as measured by its renderer.
    pub fn required_height(&self, block: &Block) -> f64 {
        let width = self.state.content_width;
        match block {
            Block::Heading(h) => heading_height(h, self.config),
            Block::Table(t) => table::measure(t, self.config),
            Block::Image(img) => image::measure(img, self.images, width, self.config),
            Block::TextBox(tb) => text_box::measure(tb, width, self.config).box_height,
            Block::PageBreak => 0.0,
        }
    }

    /// The part of a block that must land on the same page as a heading
    /// placed directly before it.
    fn leading_height(&self, block: &Block) -> f64 {
        match block {
            Block::Table(t) => {
                let first_row = if t.visual_rows().is_empty() {
                    0.0
                } else {
                    self.config.table.row_height
                };
                table::title_height(t, self.config) + self.config.table.header_height + first_row
            }
            other => self.required_height(other),
        }
    }

    fn place_unbreakable(&mut self, block: &Block) {
        let height = self.required_height(block);
        let mut decision = decide_block(self.state.remaining_height(), height, self.state.is_empty());
        if decision == BreakDecision::MoveToNextPage {
            self.new_page();
            decision = decide_block(self.state.remaining_height(), height, self.state.is_empty());
        }

        let x = self.state.content_left;
        let y = self.state.cursor_y;
        let width = self.state.content_width;
        let mut elements = self.draw_block(block, x, y, width);

        let clipped = decision == BreakDecision::Overflow;
        if clipped {
            warn!(
                "{} '{}' needs {:.1}pt but a page holds {:.1}pt; clipping",
                block.kind_name(),
                block.label(),
                height,
                self.state.content_height()
            );
            let visible = self.state.content_bottom - y;
            elements = vec![LayoutElement::clip(x, y, width, visible, elements)];
        }

        self.elements.extend(elements);
        self.record(block.kind_name(), block.label(), y, height, false, clipped);
        self.advance(height);
    }

    fn draw_block(&self, block: &Block, x: f64, y: f64, width: f64) -> Vec<LayoutElement> {
        match block {
            Block::Heading(h) => draw_heading(h, x, y, width, self.config),
            Block::Image(img) => image::draw(img, self.images, x, y, width, self.config),
            Block::TextBox(tb) => {
                let measured = text_box::measure(tb, width, self.config);
                text_box::draw(&measured, x, y, width, self.config)
            }
            Block::Table(_) | Block::PageBreak => Vec::new(),
        }
    }

    fn place_table(&mut self, table: &TableBlock) {
        let style = &self.config.table;
        let rows = table.visual_rows();
        let title_h = table::title_height(table, self.config);
        let header_h = style.header_height;
        let row_h = style.row_height;

        let first_row = if rows.is_empty() { 0.0 } else { row_h };
        let lead = title_h + header_h + first_row;
        if decide_block(self.state.remaining_height(), lead, self.state.is_empty())
            == BreakDecision::MoveToNextPage
        {
            self.new_page();
        }

        let x = self.state.content_left;
        let width = self.state.content_width;
        let mut segment_top = self.state.cursor_y;
        let mut segment_start = self.elements.len();
        let mut continued = false;

        if title_h > 0.0 {
            let title = table::draw_title(table, x, self.state.cursor_y, width, self.config);
            self.elements.extend(title);
            self.state.cursor_y += title_h;
        }
        let header = table::draw_header(table, x, self.state.cursor_y, width, self.config);
        self.elements.extend(header);
        self.state.cursor_y += header_h;

        let heights = vec![row_h; rows.len()];
        let mut next = 0;
        loop {
            let fitting = match decide_split(self.state.remaining_height(), &heights[next..]) {
                BreakDecision::Split {
                    items_on_current_page,
                } => items_on_current_page,
                BreakDecision::MoveToNextPage => 0,
                _ => rows.len() - next,
            };
            // A segment always takes at least one row so the table makes progress.
            let take = if next < rows.len() { fitting.max(1) } else { 0 };

            for (offset, cells) in rows[next..next + take].iter().enumerate() {
                let row = table::draw_row(
                    cells,
                    next + offset,
                    x,
                    self.state.cursor_y,
                    width,
                    self.config,
                );
                self.elements.extend(row);
                self.state.cursor_y += row_h;
            }
            next += take;

            let segment_height = self.state.cursor_y - segment_top;
            let clipped = self.state.cursor_y > self.state.content_bottom;
            if clipped {
                warn!(
                    "Table '{}' segment needs {:.1}pt but a page holds {:.1}pt; clipping",
                    table.title,
                    segment_height,
                    self.state.content_height()
                );
                let children = self.elements.split_off(segment_start);
                let visible = self.state.content_bottom - segment_top;
                self.elements
                    .push(LayoutElement::clip(x, segment_top, width, visible, children));
            }
            self.record("Table", table.title.clone(), segment_top, segment_height, continued, clipped);

            if next >= rows.len() {
                break;
            }

            debug!(
                "Table '{}' continues on page {} at row {}",
                table.title,
                self.state.page_index + 2,
                next
            );
            self.new_page();
            segment_top = self.state.cursor_y;
            segment_start = self.elements.len();
            continued = true;
            let header = table::draw_header(table, x, self.state.cursor_y, width, self.config);
            self.elements.extend(header);
            self.state.cursor_y += header_h;
        }

        self.state.cursor_y += self.config.block_spacing;
    }

    fn record(
        &mut self,
        kind: &'static str,
        label: String,
        y: f64,
        height: f64,
        continued: bool,
        clipped: bool,
    ) {
        self.placements.push(Placement {
            kind,
            label,
            page_index: self.state.page_index,
            y,
            height,
            continued,
            clipped,
        });
    }

    fn advance(&mut self, height: f64) {
        self.state.cursor_y += height + self.config.block_spacing;
    }

    fn new_page(&mut self) {
        self.close_page();
        self.state = self.state.next_page();
        self.draw_page_header();
    }

    fn close_page(&mut self) {
        self.pages.push(LayoutPage {
            index: self.state.page_index,
            width: self.page_width,
            height: self.page_height,
            content_top: self.state.content_top,
            content_bottom: self.state.content_bottom,
            elements: std::mem::take(&mut self.elements),
            placements: std::mem::take(&mut self.placements),
            footer: Vec::new(),
        });
    }

    /// The running header sits in the band reserved above `content_top`.
    fn draw_page_header(&mut self) {
        let Some(text) = &self.config.page_header else {
            return;
        };
        let typo = &self.config.typography;
        let line_h = typo.header_size * typo.line_height;
        let top = self.config.page.margin.top;
        let x = self.state.content_left;
        let width = self.state.content_width;

        self.elements.push(LayoutElement::text(
            x,
            top,
            line_h,
            text.clone(),
            StandardFont::HelveticaBold,
            typo.header_size,
            typo.accent_color,
        ));
        self.elements.push(LayoutElement::rect(
            x,
            top + line_h + 2.0,
            width,
            self.config.table.border_width,
            Some(self.config.table.border_color),
            None,
        ));
    }
}

// ── Headings ────────────────────────────────────────────────────

fn heading_metrics(level: HeadingLevel, config: &ReportConfig) -> (f64, f64) {
    match level {
        HeadingLevel::Title => (config.typography.title_size, 1.2),
        HeadingLevel::Section => (config.typography.section_size, 0.6),
    }
}

/// Text line plus the rule under it.
pub fn heading_height(heading: &HeadingBlock, config: &ReportConfig) -> f64 {
    let (size, rule) = heading_metrics(heading.level, config);
    size * config.typography.line_height + 2.0 + rule
}

fn draw_heading(
    heading: &HeadingBlock,
    x: f64,
    y: f64,
    width: f64,
    config: &ReportConfig,
) -> Vec<LayoutElement> {
    let (size, rule) = heading_metrics(heading.level, config);
    let typo = &config.typography;
    let line_h = size * typo.line_height;
    let font = StandardFont::HelveticaBold;
    let text = font.truncate_to_width(&heading.text, width, size);

    let line = match heading.level {
        HeadingLevel::Title => {
            LayoutElement::centered_text(x, width, y, line_h, text, font, size, typo.accent_color)
        }
        HeadingLevel::Section => {
            LayoutElement::text(x, y, line_h, text, font, size, typo.accent_color)
        }
    };
    vec![
        line,
        LayoutElement::rect(x, y + line_h + 2.0, width, rule, Some(typo.accent_color), None),
    ]
}
