//! テーブル行の列挙。
//!
//! セレクタに一致するテーブルの行を文書順で返す。テーブルが存在しない
//! 場合は空列を返し、エラーにはしない。

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use crate::extract::dom;

static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").expect("invalid row selector"));
static CELL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("th, td").expect("invalid cell selector"));
static BODY_ROW: Lazy<Selector> =
    Lazy::new(|| Selector::parse("tbody tr").expect("invalid body row selector"));

/// セレクタに一致する全テーブルの行要素（文書順）。
pub fn row_elements<'a>(doc: &'a Html, table_selector: &Selector) -> Vec<ElementRef<'a>> {
    doc.select(table_selector)
        .flat_map(|table| table.select(&ROW))
        .collect()
}

/// セレクタに一致する全テーブルの本体行のみ（ヘッダー行を除く）。
pub fn body_row_elements<'a>(doc: &'a Html, table_selector: &Selector) -> Vec<ElementRef<'a>> {
    doc.select(table_selector)
        .flat_map(|table| table.select(&BODY_ROW))
        .collect()
}

/// 1行分のセルテキスト（`th`/`td`、文書順）。
pub fn cell_texts(row: ElementRef) -> Vec<String> {
    row.select(&CELL).map(dom::text_of).collect()
}

/// セルテキストのタプル列としてテーブルを読む。
pub fn rows(doc: &Html, table_selector: &Selector) -> Vec<Vec<String>> {
    row_elements(doc, table_selector)
        .into_iter()
        .map(cell_texts)
        .collect()
}
