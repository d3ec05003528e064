//! Download the Google Fonts list and store it as a prepared snapshot.

use std::path::PathBuf;

use anyhow::Context as _;

use super::snapshot::{FontListDocument, FontListEntry, FontListFile, FontListFiles};

pub const GOOGLE_FONTS_API: &str = "https://www.googleapis.com/webfonts/v1/webfonts";

/// Convert upstream entries into the prepared shape: explicit ids, files as a list.
pub fn prepare_font_list(entries: Vec<FontListEntry>) -> Vec<FontListEntry> {
    entries
        .into_iter()
        .map(|entry| {
            let id = entry.resolved_id();
            let files = entry
                .files
                .pairs()
                .into_iter()
                .map(|(variant, url)| FontListFile {
                    variant: variant.to_string(),
                    url: url.to_string(),
                })
                .collect();
            FontListEntry {
                id: Some(id),
                files: FontListFiles::List(files),
                ..entry
            }
        })
        .collect()
}

/// Fetch the developer API list and write the prepared snapshot to every path in `outputs`.
pub async fn sync_catalog(
    client: &reqwest::Client,
    api_base: &str,
    api_key: &str,
    outputs: &[PathBuf],
) -> anyhow::Result<usize> {
    let mut url = url::Url::parse(api_base).context("invalid font list API url")?;
    url.query_pairs_mut().append_pair("key", api_key);

    log::info!("Downloading font list from {api_base} ...");
    let body = client
        .get(url)
        .send()
        .await
        .context("font list request failed")?
        .error_for_status()
        .context("font list request rejected")?
        .bytes()
        .await
        .context("font list download interrupted")?;

    let document: FontListDocument =
        serde_json::from_slice(&body).context("unexpected font list format")?;
    let prepared = prepare_font_list(document.into_entries());
    let json = serde_json::to_string(&prepared)?;

    for path in outputs {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        tokio::fs::write(path, &json)
            .await
            .with_context(|| format!("writing {}", path.display()))?;
        log::info!("Font list written to {}", path.display());
    }

    Ok(prepared.len())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::catalog::snapshot::SnapshotCatalog;

    #[test]
    fn prepared_list_round_trips_through_snapshot() {
        let document: FontListDocument = serde_json::from_str(
            r#"{"items": [{
                "family": "Open Sans",
                "category": "sans-serif",
                "variants": ["regular"],
                "files": {"regular": "https://fonts.gstatic.com/s/opensans/v40/a.ttf"}
            }]}"#,
        )
        .unwrap();

        let prepared = prepare_font_list(document.into_entries());
        let json = serde_json::to_value(&prepared).unwrap();
        assert_eq!(json[0]["id"], "opensans");
        assert_eq!(json[0]["category"], "sans-serif");
        assert_eq!(json[0]["files"][0]["variant"], "regular");

        let catalog = SnapshotCatalog::from_json(&json.to_string()).unwrap();
        assert!(catalog.find("Open Sans").unwrap().is_some());
    }
}
