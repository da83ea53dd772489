//! Layout reconstruction.
//!
//! Turns a page's positioned text blocks into lines, columns, headings, and
//! table regions. The same reconstruction serves the PDF structural path
//! and, via [`synthetic_layout`], the DOCX/plain-text paths, so every
//! format yields the same [`PageLayout`] shape.
//!
//! Reconstruction is deterministic for identical block input. The
//! thresholds below are load-bearing: downstream consumers and the test
//! suite rely on their exact values, so they are hoisted into
//! [`LayoutConfig`] rather than scattered as literals.

use regex::Regex;
use std::sync::OnceLock;

use crate::model::{BBox, Column, Line, PageLayout, TableCell, TableRegion, TextBlock};

/// Tunable thresholds for layout reconstruction.
#[derive(Debug, Clone)]
pub struct LayoutConfig {
    /// A block joins a line when its top-Y is within this distance of the
    /// line's anchor Y.
    pub line_tolerance: f32,
    /// Column split gap as a fraction of page width.
    pub column_gap_ratio: f32,
    /// Absolute lower bound for the column split gap.
    pub column_gap_min: f32,
    /// Horizontal padding applied to column bounds.
    pub column_padding: f32,
    /// A line is a heading when its uppercase ratio exceeds this.
    pub heading_uppercase_ratio: f32,
    /// Maximum significant characters for the short-capitalized heading rule.
    pub heading_short_len: usize,
    /// Minimum consecutive aligned lines that form a table.
    pub table_min_rows: usize,
    /// Minimum non-empty cells per table line.
    pub table_min_cells: usize,
    /// Line height used when synthesizing layout from linear text.
    pub synthetic_line_height: f32,
    /// Wrap width (characters) for synthesized pseudo-lines.
    pub synthetic_wrap_width: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            line_tolerance: 6.0,
            column_gap_ratio: 0.08,
            column_gap_min: 42.0,
            column_padding: 4.0,
            heading_uppercase_ratio: 0.65,
            heading_short_len: 32,
            table_min_rows: 3,
            table_min_cells: 3,
            synthetic_line_height: 20.0,
            synthetic_wrap_width: 90,
        }
    }
}

fn numeric_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+(\.\d+)*\s").unwrap())
}

fn capitalized_words_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\p{Lu}[\p{Ll}\d]*([ \t]+\p{Lu}[\p{Ll}\d]*)*\.?$").unwrap()
    })
}

/// Reconstruct the layout of one page from its blocks.
///
/// Blocks come in unordered; they leave back-annotated with their resolved
/// column index, line index, and heading flag.
pub fn reconstruct_page(
    number: u32,
    width: f32,
    height: f32,
    mut blocks: Vec<TextBlock>,
    config: &LayoutConfig,
) -> PageLayout {
    let mut page = PageLayout::new(number, width, height);
    if blocks.is_empty() {
        return page;
    }

    let columns = detect_columns(&blocks, width, config);
    log::debug!(
        "page {}: {} blocks, {} columns",
        number,
        blocks.len(),
        columns.len()
    );

    // Column assignment before line grouping so the annotation survives the
    // reorder below.
    for block in &mut blocks {
        block.column = Some(resolve_column(&columns, block.bbox.center_x()));
    }

    let line_groups = group_into_lines(&mut blocks, config);
    let mut lines = build_lines(&blocks, &line_groups);

    for line in &mut lines {
        line.heading = is_heading(&line.text, config);
    }

    // Propagate line index and heading flag back onto member blocks.
    for line in &lines {
        for id in &line.block_ids {
            if let Some(block) = blocks.iter_mut().find(|b| b.id == *id) {
                block.line = Some(line.id);
                block.heading = line.heading;
            }
        }
    }

    let tables = detect_tables(&blocks, &lines, config);
    log::debug!("page {}: {} lines, {} tables", number, lines.len(), tables.len());

    page.headings = lines
        .iter()
        .filter(|l| l.heading)
        .map(|l| l.text.clone())
        .collect();
    page.language = dominant_script(&lines.iter().map(|l| l.text.as_str()).collect::<Vec<_>>().join("\n"));
    page.columns = columns;
    page.lines = lines;
    page.tables = tables;
    page.blocks = blocks;
    page
}

/// Group blocks into Y-bands. Returns, per line, the indices of its member
/// blocks sorted left-to-right. Blocks are sorted by top-Y in place first,
/// which makes the grouping independent of input order.
fn group_into_lines(blocks: &mut [TextBlock], config: &LayoutConfig) -> Vec<Vec<usize>> {
    blocks.sort_by(|a, b| {
        a.bbox
            .y1
            .partial_cmp(&b.bbox.y1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                a.bbox
                    .x1
                    .partial_cmp(&b.bbox.x1)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    });

    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut anchor_y = f32::MIN;

    for (idx, block) in blocks.iter().enumerate() {
        if !groups.is_empty() && (block.bbox.y1 - anchor_y).abs() <= config.line_tolerance {
            groups.last_mut().unwrap().push(idx);
        } else {
            anchor_y = block.bbox.y1;
            groups.push(vec![idx]);
        }
    }

    // Left-to-right within each line.
    for group in &mut groups {
        group.sort_by(|&a, &b| {
            blocks[a]
                .bbox
                .x1
                .partial_cmp(&blocks[b].bbox.x1)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }

    groups
}

/// Materialize [`Line`]s from grouped block indices.
fn build_lines(blocks: &[TextBlock], groups: &[Vec<usize>]) -> Vec<Line> {
    groups
        .iter()
        .enumerate()
        .map(|(id, group)| {
            let y_top = group
                .iter()
                .map(|&i| blocks[i].bbox.y1)
                .fold(f32::MAX, f32::min);
            let y_bottom = group
                .iter()
                .map(|&i| blocks[i].bbox.y2)
                .fold(f32::MIN, f32::max);
            let text = group
                .iter()
                .map(|&i| blocks[i].text.trim())
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            Line {
                id,
                y_top,
                y_bottom,
                block_ids: group.iter().map(|&i| blocks[i].id).collect(),
                text,
                heading: false,
            }
        })
        .collect()
}

/// Cluster block horizontal centers into columns.
///
/// Centers are sorted and split wherever the gap between consecutive
/// centers exceeds `max(page_width * gap_ratio, gap_min)`. Sorting first
/// makes the resulting column bounds independent of block input order.
fn detect_columns(blocks: &[TextBlock], page_width: f32, config: &LayoutConfig) -> Vec<Column> {
    let mut centers: Vec<f32> = blocks.iter().map(|b| b.bbox.center_x()).collect();
    centers.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let gap_threshold = (page_width * config.column_gap_ratio).max(config.column_gap_min);

    let mut clusters: Vec<Vec<f32>> = Vec::new();
    for center in centers {
        match clusters.last_mut() {
            Some(cluster) if center - *cluster.last().unwrap() <= gap_threshold => {
                cluster.push(center);
            }
            _ => clusters.push(vec![center]),
        }
    }

    clusters
        .into_iter()
        .enumerate()
        .map(|(id, cluster)| {
            let first = *cluster.first().unwrap();
            let last = *cluster.last().unwrap();
            let mean = cluster.iter().sum::<f32>() / cluster.len() as f32;
            Column {
                id,
                start_x: first - config.column_padding,
                end_x: last + config.column_padding,
                center_x: mean,
                block_count: cluster.len(),
            }
        })
        .collect()
}

/// Resolve which column a block center belongs to. Falls back to the
/// nearest column center when padding left the point between bands.
fn resolve_column(columns: &[Column], center_x: f32) -> usize {
    if let Some(col) = columns.iter().find(|c| c.contains(center_x)) {
        return col.id;
    }
    columns
        .iter()
        .min_by(|a, b| {
            (a.center_x - center_x)
                .abs()
                .partial_cmp(&(b.center_x - center_x).abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|c| c.id)
        .unwrap_or(0)
}

/// Heading classification for one line of text.
///
/// A line is a heading when its alphabetic characters are mostly uppercase,
/// when it starts with a multi-level numeric prefix (`2.1.3 `), or when it
/// is short and every word is capitalized.
pub fn is_heading(text: &str, config: &LayoutConfig) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return false;
    }

    let letters: Vec<char> = trimmed.chars().filter(|c| c.is_alphabetic()).collect();
    if !letters.is_empty() {
        let upper = letters.iter().filter(|c| c.is_uppercase()).count();
        if upper as f32 / letters.len() as f32 > config.heading_uppercase_ratio {
            return true;
        }
    }

    if numeric_prefix_re().is_match(trimmed) {
        return true;
    }

    let significant = trimmed.chars().filter(|c| !c.is_whitespace()).count();
    significant <= config.heading_short_len && capitalized_words_re().is_match(trimmed)
}

/// Collapse runs of aligned multi-cell lines into table regions.
///
/// A line qualifies as a table row when at least `table_min_cells` of its
/// blocks carry non-empty text; `table_min_rows` consecutive qualifying
/// lines become one region.
fn detect_tables(blocks: &[TextBlock], lines: &[Line], config: &LayoutConfig) -> Vec<TableRegion> {
    let qualifies = |line: &Line| -> bool {
        let cells = line
            .block_ids
            .iter()
            .filter_map(|id| blocks.iter().find(|b| b.id == *id))
            .filter(|b| !b.text.trim().is_empty())
            .count();
        cells >= config.table_min_cells
    };

    let mut tables = Vec::new();
    let mut run_start: Option<usize> = None;

    let mut flush = |start: usize, end: usize, tables: &mut Vec<TableRegion>| {
        if end - start >= config.table_min_rows {
            let rows = lines[start..end]
                .iter()
                .map(|line| {
                    let mut cells: Vec<TableCell> = line
                        .block_ids
                        .iter()
                        .filter_map(|id| blocks.iter().find(|b| b.id == *id))
                        .filter(|b| !b.text.trim().is_empty())
                        .map(|b| TableCell {
                            text: b.text.trim().to_string(),
                            bbox: b.bbox,
                        })
                        .collect();
                    cells.sort_by(|a, b| {
                        a.bbox
                            .x1
                            .partial_cmp(&b.bbox.x1)
                            .unwrap_or(std::cmp::Ordering::Equal)
                    });
                    cells
                })
                .collect();
            tables.push(TableRegion {
                id: tables.len(),
                rows,
            });
        }
    };

    for (i, line) in lines.iter().enumerate() {
        if qualifies(line) {
            run_start.get_or_insert(i);
        } else if let Some(start) = run_start.take() {
            flush(start, i, &mut tables);
        }
    }
    if let Some(start) = run_start {
        flush(start, lines.len(), &mut tables);
    }

    tables
}

/// Build a synthetic layout for text that arrives already linear (DOCX
/// paragraphs, decoded plain text). The text wraps into pseudo-lines at a
/// fixed line height so downstream consumers see the same page shape the
/// PDF path produces.
pub fn synthetic_layout(number: u32, text: &str, config: &LayoutConfig) -> PageLayout {
    let wrapped = wrap_text(text, config.synthetic_wrap_width);

    let mut blocks = Vec::new();
    let mut lines = Vec::new();
    let mut headings = Vec::new();

    for (i, line_text) in wrapped.iter().enumerate() {
        let y = i as f32 * config.synthetic_line_height;
        let bbox = BBox::new(
            0.0,
            y,
            line_text.chars().count() as f32 * 6.0,
            y + config.synthetic_line_height * 0.6,
        );
        let heading = synthetic_heading(line_text);
        let mut block = TextBlock::new(i as u32, line_text.clone(), bbox);
        block.column = Some(0);
        block.line = Some(i);
        block.heading = heading;
        if heading {
            headings.push(line_text.clone());
        }
        lines.push(Line {
            id: i,
            y_top: bbox.y1,
            y_bottom: bbox.y2,
            block_ids: vec![block.id],
            text: line_text.clone(),
            heading,
        });
        blocks.push(block);
    }

    let width = blocks
        .iter()
        .map(|b| b.bbox.x2)
        .fold(0.0_f32, f32::max)
        .max(612.0);
    let height = (wrapped.len() as f32 * config.synthetic_line_height).max(792.0);

    let mut page = PageLayout::new(number, width, height);
    page.language = dominant_script(text);
    if !blocks.is_empty() {
        page.columns = vec![Column {
            id: 0,
            start_x: 0.0,
            end_x: width,
            center_x: width / 2.0,
            block_count: blocks.len(),
        }];
    }
    page.blocks = blocks;
    page.lines = lines;
    page.headings = headings;
    page
}

/// Heading heuristic for synthesized lines: numeric prefix or all-caps.
fn synthetic_heading(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return false;
    }
    if numeric_prefix_re().is_match(trimmed) {
        return true;
    }
    let letters: Vec<char> = trimmed.chars().filter(|c| c.is_alphabetic()).collect();
    !letters.is_empty() && letters.iter().all(|c| c.is_uppercase())
}

/// Wrap text into lines of at most `width` characters at word boundaries.
/// Existing newlines are respected; overlong unbreakable words stay whole.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut out = Vec::new();
    for source_line in text.lines() {
        let source_line = source_line.trim_end();
        if source_line.trim().is_empty() {
            continue;
        }
        let mut current = String::new();
        for word in source_line.split_whitespace() {
            if current.is_empty() {
                current.push_str(word);
            } else if current.chars().count() + 1 + word.chars().count() <= width {
                current.push(' ');
                current.push_str(word);
            } else {
                out.push(std::mem::take(&mut current));
                current.push_str(word);
            }
        }
        if !current.is_empty() {
            out.push(current);
        }
    }
    out
}

/// Dominant script of a text, when one clearly wins: `"ru"` for Cyrillic,
/// `"en"` for Latin. Requires enough letters to call it.
pub fn dominant_script(text: &str) -> Option<String> {
    let mut cyrillic = 0usize;
    let mut latin = 0usize;
    for c in text.chars() {
        if crate::encoding::is_cyrillic(c) {
            cyrillic += 1;
        } else if c.is_ascii_alphabetic() {
            latin += 1;
        }
    }
    let total = cyrillic + latin;
    if total < 20 {
        return None;
    }
    if cyrillic as f32 / total as f32 > 0.6 {
        Some("ru".to_string())
    } else if latin as f32 / total as f32 > 0.6 {
        Some("en".to_string())
    } else {
        None
    }
}
