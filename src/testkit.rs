//! Shared fixtures for pipeline and scheduler tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::fetcher::PageSource;

/// Serves canned HTML per URL; unknown URLs fail like a 404. Records every request.
#[derive(Default)]
pub struct StaticPages {
    pages: HashMap<String, String>,
    requested: Mutex<Vec<String>>,
}

impl StaticPages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, html: String) -> Self {
        self.pages.insert(url.to_string(), html);
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl PageSource for StaticPages {
    async fn fetch_html(&self, url: &str) -> Result<String> {
        if let Ok(mut r) = self.requested.lock() {
            r.push(url.to_string());
        }
        self.pages.get(url).cloned().ok_or_else(|| AppError::Status {
            url: url.to_string(),
            status: 404,
        })
    }
}

/// Odds page with the given race heading and runners `(number, name, win, place)`.
pub fn race_page(race: &str, runners: &[(u32, &str, &str, &str)]) -> String {
    let rows: String = runners
        .iter()
        .map(|(number, name, win, place)| {
            format!(
                r#"<tr class="hr-tableValue__row">
                  <td class="hr-tableValue__data hr-tableValue__data--number">
                    <span class="hr-icon__bracketNum">{frame}</span>
                  </td>
                  <td class="hr-tableValue__data hr-tableValue__data--number">{number}</td>
                  <td class="hr-tableValue__data hr-tableValue__data--horse"><a href="/horse/">{name}</a></td>
                  <td class="hr-tableValue__data hr-tableValue__data--odds"><span>{win}</span></td>
                  <td class="hr-tableValue__data hr-tableValue__data--odds"><span>{place}</span></td>
                </tr>"#,
                frame = (number + 1) / 2,
            )
        })
        .collect();
    format!(
        r#"<html><head><title>競馬 - {race} オッズ - スポーツナビ</title></head>
        <body>
          <h2 class="hr-predictRaceInfo__title">{race}<span class="hr-label">GI</span></h2>
          <table class="hr-tableValue"><tbody>{rows}</tbody></table>
        </body></html>"#
    )
}
