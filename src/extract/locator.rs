//! ラベル付きフィールドの探索。
//!
//! kabutan.jpのページでは、同じ項目でもセクションによって「縦持ち」
//! （ラベルの隣に値）と「横持ち」（ヘッダー行と値行）のレイアウトが
//! 混在する。どちらが使われるかは事前に分からないため、順序付きの
//! 探索戦略を短絡合成して最初に当たったものを採用する。

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use crate::extract::dom;

static HEADER_CELLS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("th, td, dt, span").expect("invalid header cell selector"));
static ROW_CELLS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("th, td").expect("invalid row cell selector"));
static BODY_CELLS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td").expect("invalid body cell selector"));
static TBODY: Lazy<Selector> = Lazy::new(|| Selector::parse("tbody").expect("invalid tbody selector"));
static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").expect("invalid row selector"));

/// ラベル照合モード。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// セルのテキストがラベルと完全一致。
    Exact,
    /// ラベルを含む短いセル（20文字未満）も許容する。
    Fuzzy,
}

/// Locate the value for a labeled field anywhere in the document.
///
/// 最初に構造的に一致した候補を返す。複数候補間のスコアリングは行わない
/// （単純さ優先の既知の割り切り）。見つからなければ `None` を返し、呼び出し
/// 側が番兵値に置き換える。
pub fn locate(doc: &Html, label: &str, mode: MatchMode) -> Option<String> {
    for cell in doc.select(&HEADER_CELLS) {
        let cell_text = dom::text_of(cell);
        if !matches_label(&cell_text, label, mode) {
            continue;
        }
        if let Some(value) = vertical_value(cell, label) {
            return Some(value);
        }
        if let Some(value) = horizontal_value(cell) {
            return Some(value);
        }
        if let Some(value) = parent_sibling_value(cell, label) {
            return Some(value);
        }
    }
    None
}

fn matches_label(cell_text: &str, label: &str, mode: MatchMode) -> bool {
    match mode {
        MatchMode::Exact => cell_text == label,
        MatchMode::Fuzzy => {
            cell_text == label
                || (cell_text.contains(label) && cell_text.chars().count() < 20)
        }
    }
}

/// 縦持ちレイアウト: ラベルセルの直後の兄弟セルが値。
fn vertical_value(cell: ElementRef, label: &str) -> Option<String> {
    let sibling = dom::next_sibling_element(cell)?;
    if !matches!(sibling.value().name(), "td" | "dd" | "span") {
        return None;
    }
    let text = dom::text_of(sibling);
    if !text.is_empty() && text != label {
        Some(text)
    } else {
        None
    }
}

/// 横持ちレイアウト: ヘッダー行の列位置を値行の同じ列で読む。
fn horizontal_value(cell: ElementRef) -> Option<String> {
    let cell = header_cell_of(cell)?;
    let row = dom::enclosing_row(cell)?;
    let table = dom::enclosing(cell, "table")?;

    let row_cells: Vec<ElementRef> = row.select(&ROW_CELLS).collect();
    let idx = row_cells.iter().position(|c| c.id() == cell.id())?;

    // theadヘッダー + tbodyデータの形なら、本体側の先頭行を読む
    if let Some(tbody) = table.select(&TBODY).next() {
        let row_parent = row.parent().map(|p| p.id());
        if row_parent != Some(tbody.id()) {
            if let Some(first_row) = tbody.select(&ROW).next() {
                let body_cells: Vec<ElementRef> = first_row.select(&BODY_CELLS).collect();
                if let Some(value_cell) = body_cells.get(idx) {
                    let text = dom::text_of(*value_cell);
                    if !text.is_empty() {
                        return Some(text);
                    }
                }
            }
            return None;
        }
    }

    // 明示的な本体を持たない「ラベル行/値行」断片は直後の行を読む
    let next_row = dom::next_sibling_element(row)?;
    if next_row.value().name() != "tr" {
        return None;
    }
    let value_cells: Vec<ElementRef> = next_row.select(&ROW_CELLS).collect();
    let value_cell = value_cells.get(idx)?;
    let text = dom::text_of(*value_cell);
    if !text.is_empty() {
        Some(text)
    } else {
        None
    }
}

/// ブロック要素で隣接するラベル/値の組: 親の次の兄弟要素が値。
fn parent_sibling_value(cell: ElementRef, label: &str) -> Option<String> {
    let parent = dom::parent_element(cell)?;
    let sibling = dom::next_sibling_element(parent)?;
    let text = dom::text_of(sibling);
    if !text.is_empty() && text != label {
        Some(text)
    } else {
        None
    }
}

/// マッチした要素が行セルでない場合（span等）は、包含するth/tdに持ち上げる。
fn header_cell_of(cell: ElementRef) -> Option<ElementRef> {
    match cell.value().name() {
        "th" | "td" => Some(cell),
        _ => dom::enclosing(cell, "th").or_else(|| dom::enclosing(cell, "td")),
    }
}
