//! Renders sweep reports and production link sets into the artifacts the
//! site build consumes.

use crate::domain::model::{LinkSet, SweepReport, SweepResult};
use crate::utils::error::{GeoLinkError, Result};

pub fn sweep_json(report: &SweepReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

fn format_km(avg_km: Option<f64>) -> String {
    avg_km.map(|km| format!("{:.2}", km)).unwrap_or_else(|| "n/a".to_string())
}

fn weights_summary(result: &SweepResult) -> String {
    let w = &result.weights;
    format!(
        "cluster {:.3}, distance {:.3}, reciprocal {:.3}, hub {:.3}, scale {:.1} km",
        w.weight_cluster, w.weight_distance, w.weight_reciprocal_edge, w.weight_hub_damping, w.distance_scale_km
    )
}

pub fn sweep_markdown(report: &SweepReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("# Policy sweep: {}\n\n", report.service));
    out.push_str(&format!(
        "Generated {}. {} variants tried, top {} shown.\n\n",
        report.generated_at,
        report.variants_tried,
        report.ranking.len()
    ));
    out.push_str("| # | Variant | Gini | Avg km | Cluster purity | Links | Weights |\n");
    out.push_str("|---|---------|------|--------|----------------|-------|---------|\n");
    for (i, result) in report.ranking.iter().enumerate() {
        out.push_str(&format!(
            "| {} | `{}` | {:.4} | {} | {:.3} | {} | {} |\n",
            i + 1,
            result.kind,
            result.metrics.gini,
            format_km(result.metrics.avg_km),
            result.metrics.cluster_purity,
            result.metrics.total_links,
            weights_summary(result)
        ));
    }
    out
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub fn sweep_html(report: &SweepReport) -> String {
    let service = escape_html(&report.service);
    let mut rows = String::new();
    for (i, result) in report.ranking.iter().enumerate() {
        rows.push_str(&format!(
            "      <tr><td>{}</td><td><code>{}</code></td><td>{:.4}</td><td>{}</td><td>{:.3}</td><td>{}</td><td>{}</td></tr>\n",
            i + 1,
            escape_html(&result.kind),
            result.metrics.gini,
            format_km(result.metrics.avg_km),
            result.metrics.cluster_purity,
            result.metrics.total_links,
            escape_html(&weights_summary(result))
        ));
    }

    format!(
        r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Policy sweep: {service}</title>
</head>
<body>
  <h1>Policy sweep: {service}</h1>
  <p>Generated {generated}. {tried} variants tried, top {shown} shown.</p>
  <table>
    <thead>
      <tr><th>#</th><th>Variant</th><th>Gini</th><th>Avg km</th><th>Cluster purity</th><th>Links</th><th>Weights</th></tr>
    </thead>
    <tbody>
{rows}    </tbody>
  </table>
</body>
</html>
"#,
        service = service,
        generated = escape_html(&report.generated_at),
        tried = report.variants_tried,
        shown = report.ranking.len(),
        rows = rows
    )
}

pub fn links_json(link_sets: &[LinkSet]) -> Result<String> {
    Ok(serde_json::to_string_pretty(link_sets)?)
}

/// One row per edge: service, suburb, rank (1-based), neighbor.
pub fn links_csv(link_sets: &[LinkSet]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["service", "suburb", "rank", "neighbor"])?;

    for set in link_sets {
        for (rank, neighbor) in set.neighbors.iter().enumerate() {
            let rank = (rank + 1).to_string();
            writer.write_record([set.service.as_str(), set.suburb.as_str(), rank.as_str(), neighbor.as_str()])?;
        }
    }

    writer.into_inner().map_err(|e| GeoLinkError::ReportError {
        artifact: "links.csv".to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{PolicyWeights, SweepMetrics};

    fn report() -> SweepReport {
        SweepReport {
            generated_at: "2024-05-01T00:00:00+00:00".to_string(),
            service: "bond-cleaning".to_string(),
            variants_tried: 23,
            ranking: vec![SweepResult {
                kind: "combo:distance+hub".to_string(),
                weights: PolicyWeights::default(),
                metrics: SweepMetrics {
                    gini: 0.125,
                    avg_km: None,
                    cluster_purity: 0.75,
                    total_links: 12,
                },
            }],
        }
    }

    #[test]
    fn test_sweep_json_uses_camel_case() {
        let value: serde_json::Value = serde_json::from_str(&sweep_json(&report()).unwrap()).unwrap();
        assert_eq!(value["variantsTried"], 23);
        assert_eq!(value["ranking"][0]["metrics"]["avgKm"], serde_json::Value::Null);
        assert_eq!(value["ranking"][0]["metrics"]["clusterPurity"], 0.75);
    }

    #[test]
    fn test_markdown_and_html_tables() {
        let md = sweep_markdown(&report());
        assert!(md.contains("| 1 | `combo:distance+hub` | 0.1250 | n/a | 0.750 | 12 |"));

        let html = sweep_html(&report());
        assert!(html.contains("<td><code>combo:distance+hub</code></td>"));
        assert!(html.contains("23 variants tried"));
        assert_eq!(escape_html("<a & 'b'>"), "&lt;a &amp; &#39;b&#39;&gt;");
    }

    #[test]
    fn test_links_csv_rows() {
        let sets = vec![LinkSet {
            service: "bond-cleaning".to_string(),
            suburb: "goodna".to_string(),
            neighbors: vec!["redbank".to_string(), "gailes".to_string()],
        }];
        let csv = String::from_utf8(links_csv(&sets).unwrap()).unwrap();
        assert_eq!(
            csv,
            "service,suburb,rank,neighbor\nbond-cleaning,goodna,1,redbank\nbond-cleaning,goodna,2,gailes\n"
        );
    }
}
