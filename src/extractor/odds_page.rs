use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::selectors;
use crate::extractor::numbers::{parse_place_odds, parse_win_odds};
use crate::types::OddsRecord;

struct Selectors {
    race_title: Selector,
    page_title: Selector,
    row: Selector,
    number_cell: Selector,
    bracket_marker: Selector,
    horse_cell: Selector,
    link: Selector,
    odds_cell: Selector,
}

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid static selector")
}

static SELECTORS: LazyLock<Selectors> = LazyLock::new(|| Selectors {
    race_title: selector(selectors::RACE_TITLE),
    page_title: selector(selectors::PAGE_TITLE),
    row: selector(selectors::ROW),
    number_cell: selector(selectors::NUMBER_CELL),
    bracket_marker: selector(selectors::BRACKET_MARKER),
    horse_cell: selector(selectors::HORSE_CELL),
    link: selector(selectors::LINK),
    odds_cell: selector(selectors::ODDS_CELL),
});

/// Why a table row produced no record.
#[derive(Debug, Error, PartialEq, Eq)]
enum RowSkip {
    #[error("no competitor number cell outside the bracket marker")]
    MissingNumber,
    #[error("competitor number cell is empty")]
    EmptyNumber,
    #[error("no horse cell")]
    MissingHorseCell,
    #[error("horse name is empty")]
    EmptyName,
}

/// Extract one record per odds-table row. Never fails: unexpected markup yields
/// fewer (possibly zero) records, in document order.
pub fn extract(html: &str) -> Vec<OddsRecord> {
    let doc = Html::parse_document(html);
    let sel = &*SELECTORS;

    let race_name = resolve_race_name(&doc, sel);
    if race_name.is_empty() {
        warn!("Race name not found in heading or <title>; records will carry an empty race name");
    }

    let mut records = Vec::new();
    let mut scanned = 0usize;
    for (idx, row) in doc.select(&sel.row).enumerate() {
        scanned = idx + 1;
        match extract_row(row, sel, &race_name) {
            Ok(record) => records.push(record),
            Err(skip) => warn!(row = idx, race = %race_name, "Skipping odds row: {skip}"),
        }
    }

    info!(
        race = %race_name,
        "Extraction complete: {} records from {} rows",
        records.len(),
        scanned,
    );
    records
}

fn resolve_race_name(doc: &Html, sel: &Selectors) -> String {
    if let Some(heading) = doc.select(&sel.race_title).next() {
        let name = normalize_ws(&direct_text(heading));
        if !name.is_empty() {
            return name;
        }
    }

    let Some(title) = doc.select(&sel.page_title).next() else {
        return String::new();
    };
    let title = element_text(title);
    match race_name_from_title(&title) {
        Some(name) => {
            debug!(race = %name, "Race name taken from <title>");
            name
        }
        None => String::new(),
    }
}

/// `競馬 - 有馬記念 オッズ - スポーツナビ` → `有馬記念`.
fn race_name_from_title(title: &str) -> Option<String> {
    let rest = title.trim().strip_prefix(selectors::TITLE_PREFIX)?;
    let end = rest.find(selectors::TITLE_SUFFIX)?;
    let name = rest[..end].trim();
    (!name.is_empty()).then(|| name.to_string())
}

fn extract_row(row: ElementRef<'_>, sel: &Selectors, race_name: &str) -> Result<OddsRecord, RowSkip> {
    // The bracket (frame) number shares the number-cell class; it is the one wrapped in a marker.
    let number_cell = row
        .select(&sel.number_cell)
        .find(|cell| cell.select(&sel.bracket_marker).next().is_none())
        .ok_or(RowSkip::MissingNumber)?;
    let horse_number = element_text(number_cell);
    if horse_number.is_empty() {
        return Err(RowSkip::EmptyNumber);
    }

    let horse_cell = row.select(&sel.horse_cell).next().ok_or(RowSkip::MissingHorseCell)?;
    let horse_name = match horse_cell.select(&sel.link).next() {
        Some(link) => element_text(link),
        None => element_text(horse_cell),
    };
    if horse_name.is_empty() {
        return Err(RowSkip::EmptyName);
    }

    let mut odds_cells = row.select(&sel.odds_cell);
    let win_odds = odds_cells.next().and_then(|c| parse_win_odds(&element_text(c)));
    let place_odds = odds_cells.next().and_then(|c| parse_place_odds(&element_text(c)));

    Ok(OddsRecord {
        race_name: race_name.to_string(),
        horse_number,
        horse_name,
        win_odds,
        place_odds,
    })
}

/// Text of the element's own text nodes, ignoring nested badges.
fn direct_text(el: ElementRef<'_>) -> String {
    el.children()
        .filter_map(|child| child.value().as_text())
        .map(|t| &**t)
        .collect()
}

/// All descendant text, whitespace-collapsed and trimmed.
fn element_text(el: ElementRef<'_>) -> String {
    normalize_ws(&el.text().collect::<String>())
}

fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn page(race: &str, rows: &str) -> String {
        format!(
            r#"<html>
              <head><title>競馬 - {race} オッズ - スポーツナビ</title></head>
              <body>
                <h1 class="hr-style--hidden">スポーツナビ</h1>
                <h2 class="hr-predictRaceInfo__title">
                  {race}
                  <span class="hr-label hr-label--g2">GII</span>
                </h2>
                <table class="hr-tableValue">
                  <thead>
                    <tr>
                      <th class="hr-tableValue__head--number">枠番</th>
                      <th class="hr-tableValue__head--number">馬番</th>
                      <th class="hr-tableValue__head--horse">馬名</th>
                      <th class="hr-tableValue__head--odds">単勝</th>
                      <th class="hr-tableValue__head--odds">複勝</th>
                    </tr>
                  </thead>
                  <tbody>{rows}</tbody>
                </table>
              </body>
            </html>"#
        )
    }

    fn row(frame: u32, number: u32, name: &str, win: &str, place: &str) -> String {
        format!(
            r#"<tr class="hr-tableValue__row">
              <td class="hr-tableValue__data hr-tableValue__data--number">
                <span class="hr-icon__bracketNum hr-icon__bracketNum--{frame}">{frame}</span>
              </td>
              <td class="hr-tableValue__data hr-tableValue__data--number">{number}</td>
              <td class="hr-tableValue__data hr-tableValue__data--horse">
                <a href="/keiba/directory/horse/dummy/">{name}</a>
              </td>
              <td class="hr-tableValue__data hr-tableValue__data--odds"><span>{win}</span></td>
              <td class="hr-tableValue__data hr-tableValue__data--odds"><span>{place}</span></td>
            </tr>"#
        )
    }

    #[test]
    fn extracts_rows_in_document_order() {
        let rows = row(1, 1, "キタサンブラック", "2.5", "1.2 - 1.5")
            + &row(2, 2, "イクイノックス", "1.8", "1.1-1.3");
        let records = extract(&page("中山記念", &rows));

        assert_eq!(records.len(), 2);
        let first = &records[0];
        assert_eq!(first.race_name, "中山記念");
        assert_eq!(first.horse_number, "1");
        assert_eq!(first.horse_name, "キタサンブラック");
        assert_eq!(first.win_odds, Some(dec!(2.5)));
        assert_eq!(first.place_odds_min(), Some(dec!(1.2)));
        assert_eq!(first.place_odds_max(), Some(dec!(1.5)));

        let second = &records[1];
        assert_eq!(second.horse_number, "2");
        assert_eq!(second.win_odds, Some(dec!(1.8)));
        assert_eq!(second.place_odds_min(), Some(dec!(1.1)));
        assert_eq!(second.place_odds_max(), Some(dec!(1.3)));
    }

    #[test]
    fn bracket_number_is_not_mistaken_for_horse_number() {
        let records = extract(&page("大阪杯", &row(3, 5, "テスト馬", "10.5", "3.2 - 4.5")));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].horse_number, "5");
        assert_eq!(records[0].horse_name, "テスト馬");
        assert_eq!(records[0].win_odds, Some(dec!(10.5)));
    }

    #[test]
    fn unposted_odds_keep_the_row() {
        let rows = r#"<tr class="hr-tableValue__row">
              <td class="hr-tableValue__data hr-tableValue__data--number">
                <span class="hr-icon__bracketNum hr-icon__bracketNum--1">1</span>
              </td>
              <td class="hr-tableValue__data hr-tableValue__data--number">3</td>
              <td class="hr-tableValue__data hr-tableValue__data--horse">
                <a href="/keiba/directory/horse/dummy/">タイトルホルダー</a>
              </td>
              <td class="hr-tableValue__data hr-tableValue__data--odds">---</td>
              <td class="hr-tableValue__data hr-tableValue__data--odds"></td>
            </tr>"#;
        let records = extract(&page("阪神大賞典", rows));
        assert_eq!(records.len(), 1);
        let horse = &records[0];
        assert_eq!(horse.race_name, "阪神大賞典");
        assert_eq!(horse.horse_number, "3");
        assert_eq!(horse.win_odds, None);
        assert_eq!(horse.place_odds, None);
    }

    #[test]
    fn missing_odds_cells_keep_the_row() {
        let rows = r#"<tr class="hr-tableValue__row">
              <td class="hr-tableValue__data hr-tableValue__data--number">9</td>
              <td class="hr-tableValue__data hr-tableValue__data--horse">  ドウデュース  </td>
            </tr>"#;
        let records = extract(&page("有馬記念", rows));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].horse_number, "9");
        assert_eq!(records[0].horse_name, "ドウデュース");
        assert_eq!(records[0].win_odds, None);
        assert_eq!(records[0].place_odds, None);
    }

    #[test]
    fn bad_rows_are_skipped_without_aborting_the_page() {
        let no_number = r#"<tr class="hr-tableValue__row">
              <td class="hr-tableValue__data hr-tableValue__data--number">
                <span class="hr-icon__bracketNum">4</span>
              </td>
              <td class="hr-tableValue__data hr-tableValue__data--horse"><a>名無し</a></td>
            </tr>"#;
        let no_horse = r#"<tr class="hr-tableValue__row">
              <td class="hr-tableValue__data hr-tableValue__data--number">6</td>
            </tr>"#;
        let empty_name = r#"<tr class="hr-tableValue__row">
              <td class="hr-tableValue__data hr-tableValue__data--number">7</td>
              <td class="hr-tableValue__data hr-tableValue__data--horse"><a> </a></td>
            </tr>"#;
        let rows = format!("{no_number}{no_horse}{empty_name}{}", row(4, 8, "残る馬", "7.7", "2.0-3.0"));
        let records = extract(&page("天皇賞", &rows));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].horse_number, "8");
    }

    #[test]
    fn heading_excludes_grade_badge() {
        let records = extract(&page("中山記念", &row(1, 1, "馬", "2.0", "1.1-1.2")));
        assert_eq!(records[0].race_name, "中山記念");
    }

    #[test]
    fn race_name_falls_back_to_title() {
        let html = format!(
            r#"<html><head><title>競馬 - 有馬記念 オッズ - スポーツナビ</title></head>
            <body><table class="hr-tableValue"><tbody>{}</tbody></table></body></html>"#,
            row(1, 1, "テスト馬", "5.0", "1.5 - 2.0")
        );
        let records = extract(&html);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].race_name, "有馬記念");
    }

    #[test]
    fn unrecoverable_race_name_is_empty() {
        let html = format!(
            r#"<html><head><title>Odds</title></head>
            <body><table><tbody>{}</tbody></table></body></html>"#,
            row(1, 2, "テスト馬", "5.0", "")
        );
        let records = extract(&html);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].race_name, "");
    }

    #[test]
    fn empty_or_non_html_input_yields_nothing() {
        assert!(extract("").is_empty());
        assert!(extract("{\"not\": \"html\"}").is_empty());
        assert!(extract(&page("テストレース", "")).is_empty());
    }

    #[test]
    fn title_pattern() {
        assert_eq!(
            race_name_from_title("競馬 - 有馬記念 オッズ - スポーツナビ").as_deref(),
            Some("有馬記念")
        );
        assert_eq!(race_name_from_title("有馬記念"), None);
        assert_eq!(race_name_from_title("競馬 -  オッズ - スポーツナビ"), None);
    }
}
