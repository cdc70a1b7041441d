//! タグツリー探索の補助関数群。
//!
//! `scraper::Html` は壊れたマークアップでも必ずツリーを返すので、ここでは
//! 構造的に不正な文書を想定したエラー処理は行わない。探索が外れた場合は
//! 常に `None` を返す。

use scraper::{ElementRef, Html, Selector};

/// Parse raw markup into a navigable document tree.
///
/// Never fails: malformed input yields a minimal tree.
pub fn parse(raw: &str) -> Html {
    Html::parse_document(raw)
}

/// Concatenated, per-fragment-trimmed text content of an element.
pub fn text_of(el: ElementRef) -> String {
    el.text().map(str::trim).collect::<String>()
}

/// 次の兄弟要素（テキストノードは読み飛ばす）。
pub fn next_sibling_element(el: ElementRef) -> Option<ElementRef> {
    el.next_siblings().find_map(ElementRef::wrap)
}

/// 親要素。
pub fn parent_element(el: ElementRef) -> Option<ElementRef> {
    el.parent().and_then(ElementRef::wrap)
}

/// セルを含む `<tr>` を祖先方向に探す。
pub fn enclosing_row(el: ElementRef) -> Option<ElementRef> {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == "tr")
}

/// 指定タグ名の最初の祖先要素。
pub fn enclosing<'a>(el: ElementRef<'a>, tag: &str) -> Option<ElementRef<'a>> {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == tag)
}

/// Find the first `<table>` following `from` in document order.
///
/// 見出し要素の直後にあるテーブルを探すために使う。兄弟にテーブルが
/// 無ければ祖先を一段ずつ上がり、各兄弟のサブツリーも調べる。
pub fn find_next_table<'a>(from: ElementRef<'a>) -> Option<ElementRef<'a>> {
    let table_selector = Selector::parse("table").ok()?;
    let mut current: Option<ElementRef<'a>> = Some(from);
    while let Some(el) = current {
        for sibling in el.next_siblings() {
            if let Some(sib_el) = ElementRef::wrap(sibling) {
                if sib_el.value().name() == "table" {
                    return Some(sib_el);
                }
                if let Some(nested) = sib_el.select(&table_selector).next() {
                    return Some(nested);
                }
            }
        }
        current = parent_element(el);
    }
    None
}
