//! Public status page.
//!
//! One live probe (PocketBase health endpoint, with response time) plus
//! configuration checks for the keyed services. Rendered as a standalone
//! HTML page; HTTP 200 when everything is green, 503 otherwise so uptime
//! monitors can watch this URL directly.

use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
};
use chrono::Utc;

/// One row of the status card.
#[derive(Debug, Clone)]
pub struct ServiceStatus {
    pub name: &'static str,
    pub operational: bool,
    pub response_time_ms: Option<u64>,
}

/// GET `/status`
pub async fn status_page(State(state): State<AppState>) -> impl IntoResponse {
    let pb = state.pocketbase.health().await;

    let services = vec![
        ServiceStatus {
            name: "PocketBase (Database)",
            operational: pb.operational,
            response_time_ms: pb.response_time_ms,
        },
        ServiceStatus {
            name: "DeepSeek (AI)",
            operational: !state.config.deepseek_api_key.is_empty(),
            response_time_ms: None,
        },
        ServiceStatus {
            name: "Google Text-to-Speech",
            operational: !state.config.google_tts_api_key.is_empty(),
            response_time_ms: None,
        },
        ServiceStatus {
            name: "Resend (Email)",
            operational: !state.config.resend_api_key.is_empty(),
            response_time_ms: None,
        },
    ];

    let all_operational = services.iter().all(|s| s.operational);
    let checked_at = Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let html = render_status_page(&services, all_operational, &checked_at);

    let status = if all_operational {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Html(html))
}

fn render_status_page(services: &[ServiceStatus], all_operational: bool, checked_at: &str) -> String {
    let (banner_text, banner_color) = if all_operational {
        ("All Systems Operational", "#16a34a")
    } else {
        ("Degraded Performance", "#d97706")
    };

    let mut rows = String::new();
    for svc in services {
        let (dot, css_status, label) = if svc.operational {
            ("green", "ok", "Operational")
        } else {
            ("red", "down", "Unavailable")
        };
        let meta = svc
            .response_time_ms
            .map(|ms| format!(r#"<span class="service-meta">{}ms</span>"# , ms))
            .unwrap_or_default();
        rows.push_str(&format!(
            r#"
      <div class="service-row">
        <span class="dot dot-{dot}"></span>
        <span class="service-name">{name}</span>
        {meta}
        <span class="service-status status-{css_status}">{label}</span>
      </div>"#,
            dot = dot,
            name = svc.name,
            meta = meta,
            css_status = css_status,
            label = label,
        ));
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>EversAPIs - Status</title>
  <style>
    *, *::before, *::after {{ box-sizing: border-box; margin: 0; padding: 0; }}

    body {{
      font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Helvetica, Arial, sans-serif;
      background: #f5f5f5;
      color: #1a1a1a;
      min-height: 100vh;
    }}

    .banner {{
      padding: 40px 24px;
      text-align: center;
      color: #fff;
      background: {banner_color};
    }}
    .banner h1 {{
      font-size: 1.6rem;
      font-weight: 700;
      letter-spacing: -0.02em;
    }}
    .banner p {{
      margin-top: 6px;
      font-size: 0.875rem;
      opacity: 0.8;
    }}

    .container {{
      max-width: 640px;
      margin: 40px auto;
      padding: 0 16px;
    }}

    .card {{
      background: #fff;
      border-radius: 10px;
      border: 1px solid #e5e5e5;
      overflow: hidden;
      box-shadow: 0 1px 3px rgba(0,0,0,0.06);
    }}

    .card-header {{
      padding: 14px 20px;
      border-bottom: 1px solid #e5e5e5;
      font-size: 0.7rem;
      font-weight: 600;
      text-transform: uppercase;
      letter-spacing: 0.1em;
      color: #999;
    }}

    .service-row {{
      display: flex;
      align-items: center;
      padding: 15px 20px;
      border-bottom: 1px solid #f2f2f2;
      gap: 12px;
    }}
    .service-row:last-child {{ border-bottom: none; }}

    .dot {{
      width: 9px;
      height: 9px;
      border-radius: 50%;
      flex-shrink: 0;
    }}
    .dot-green  {{ background: #22c55e; box-shadow: 0 0 0 3px rgba(34,197,94,0.15); }}
    .dot-red    {{ background: #ef4444; box-shadow: 0 0 0 3px rgba(239,68,68,0.15); }}

    .service-name {{
      flex: 1;
      font-size: 0.925rem;
      font-weight: 500;
    }}

    .service-meta {{
      font-size: 0.775rem;
      color: #bbb;
      font-variant-numeric: tabular-nums;
    }}

    .service-status {{
      font-size: 0.775rem;
      font-weight: 600;
      min-width: 80px;
      text-align: right;
    }}
    .status-ok   {{ color: #16a34a; }}
    .status-down {{ color: #dc2626; }}

    .footer {{
      text-align: center;
      margin: 24px 0 48px;
      font-size: 0.75rem;
      color: #bbb;
    }}
  </style>
</head>
<body>

  <div class="banner">
    <h1>{banner_text}</h1>
    <p>EversAPIs Infrastructure</p>
  </div>

  <div class="container">
    <div class="card">
      <div class="card-header">Services</div>
{rows}

    </div>

    <div class="footer">Last checked {checked_at} UTC</div>
  </div>

</body>
</html>"#,
        banner_color = banner_color,
        banner_text = banner_text,
        rows = rows,
        checked_at = checked_at,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn services(pb_up: bool) -> Vec<ServiceStatus> {
        vec![
            ServiceStatus {
                name: "PocketBase (Database)",
                operational: pb_up,
                response_time_ms: pb_up.then_some(12),
            },
            ServiceStatus {
                name: "Resend (Email)",
                operational: true,
                response_time_ms: None,
            },
        ]
    }

    #[test]
    fn green_banner_when_everything_is_up() {
        let html = render_status_page(&services(true), true, "2025-06-15 18:30:00");
        assert!(html.contains("All Systems Operational"));
        assert!(html.contains("12ms"));
        assert!(html.contains("Last checked 2025-06-15 18:30:00 UTC"));
        assert!(!html.contains("Unavailable"));
    }

    #[test]
    fn amber_banner_when_a_dependency_is_down() {
        let html = render_status_page(&services(false), false, "2025-06-15 18:30:00");
        assert!(html.contains("Degraded Performance"));
        assert!(html.contains("dot-red"));
        assert!(html.contains("Unavailable"));
    }
}
