//! HTTP handler for the portfolio contact form.
//!
//! Flow: honeypot + field validation, a 24h resubmission throttle backed by
//! a PocketBase query, record creation, then a best-effort Resend
//! notification email. Responses are HTML fragments the portfolio site
//! swaps into the page.

use crate::{
    errors::AppError,
    models::{contact::ContactSubmission, format_pb_timestamp, parse_pb_timestamp},
    state::AppState,
};
use axum::{
    extract::{ConnectInfo, Form, State},
    http::HeaderMap,
    response::Html,
};
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use tracing::warn;

const COLLECTION: &str = "portfolio_contactform";
const EMAIL_SUBJECT: &str = "New Contact Form Submission";

/// How long one IP/email pair is locked out after submitting.
const THROTTLE_HOURS: i64 = 24;

#[derive(Debug, Deserialize, Default)]
pub struct ContactForm {
    /// Honeypot: humans never see this field, bots fill it.
    pub website: Option<String>,
    #[serde(rename = "firstName")]
    pub first_name: Option<String>,
    #[serde(rename = "lastName")]
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub message: Option<String>,
}

/// POST `/portfolio-contact-form/`
pub async fn handle_form(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Form(form): Form<ContactForm>,
) -> Result<Html<String>, AppError> {
    if form.website.as_deref().is_some_and(|w| !w.is_empty()) {
        return Err(AppError::bad_request("Bot detected"));
    }

    let first_name = trimmed(&form.first_name);
    let last_name = trimmed(&form.last_name);
    let email = trimmed(&form.email).to_lowercase();
    let phone = trimmed(&form.phone);
    let message = trimmed(&form.message);

    if [&first_name, &last_name, &email, &phone, &message]
        .iter()
        .any(|field| field.is_empty())
    {
        return Err(AppError::bad_request(
            "All fields (first name, last name, email, phone, message) are required.",
        ));
    }

    let name = format!("{} {}", first_name, last_name);
    let ip_address = client_ip(&headers, addr);

    // One submission per IP or email per 24h.
    let window_start = format_pb_timestamp(Utc::now() - Duration::hours(THROTTLE_HOURS));
    let filter = format!(
        "(ip_address = \"{}\" || email = \"{}\") && created > \"{}\"",
        ip_address, email, window_start
    );
    let recent = state
        .pocketbase
        .list_records::<ContactSubmission>(COLLECTION, 1, 1, Some(&filter), None)
        .await?;
    if recent.total_items > 0 {
        return Ok(Html(too_many_requests_html(&name)));
    }

    let record: ContactSubmission = state
        .pocketbase
        .create_record(
            COLLECTION,
            &json!({
                "name": name,
                "email": email,
                "phone": phone,
                "message": message,
                "ip_address": ip_address,
            }),
        )
        .await?;

    let created_human = parse_pb_timestamp(&record.created)
        .map(|dt| dt.format("%B %d, %Y at %-I:%M %p UTC").to_string())
        .unwrap_or_else(|| record.created.clone());

    let html_body = build_email_html(&record, &created_human);
    let recipients = [state.config.contact_recipient.clone()];
    if let Err(err) = state
        .mailer
        .send_html(&recipients, EMAIL_SUBJECT, &html_body)
        .await
    {
        // The submission is already stored; losing the notification is
        // tolerable.
        warn!("failed to send contact-form email: {}", err);
    }

    Ok(Html(THANK_YOU_HTML.to_string()))
}

fn trimmed(field: &Option<String>) -> String {
    field.as_deref().unwrap_or_default().trim().to_string()
}

/// First hop of `X-Forwarded-For` when present (the service runs behind a
/// proxy in production), otherwise the peer address.
fn client_ip(headers: &HeaderMap, addr: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| addr.ip().to_string())
}

fn html_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

const THANK_YOU_HTML: &str = r#"
        <section id="contact" class="section contact-section">
            <div class="container text-center">
                <h2 class="contact-title mb-8 text-teal-400">Thank You!</h2>
                <p class="text-lg">Your message has been successfully submitted.</p>
            </div>
        </section>
"#;

fn too_many_requests_html(name: &str) -> String {
    format!(
        r#"
            <section class="error-section">
                <div style="max-width: 600px; margin: auto; padding: 30px; background: #2a2a2a; border: 1px solid #ff4d4d; border-radius: 8px; text-align: center;">
                    <h2 style="color: #ff6b6b;">Too Many Requests</h2>
                    <p style="color: #cccccc;">You <strong>{}</strong> have submitted the form already so take a break. Please wait 24 hours before trying again.</p>
                </div>
            </section>
            "#,
        html_escape(name)
    )
}

fn build_email_html(record: &ContactSubmission, submitted_at: &str) -> String {
    format!(
        r#"
    <!DOCTYPE html>
    <html lang="en">
    <head>
        <meta charset="UTF-8" />
        <meta name="viewport" content="width=device-width, initial-scale=1" />
        <style>
        body {{
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Helvetica, Arial, sans-serif;
            background-color: #f5f8fa;
            color: #333;
            margin: 0;
            padding: 20px;
        }}
        .container {{
            background: #fff;
            max-width: 600px;
            margin: auto;
            border-radius: 8px;
            box-shadow: 0 4px 10px rgba(0,0,0,0.1);
            padding: 30px;
        }}
        h1 {{
            color: #0077cc;
            font-size: 24px;
            margin-bottom: 20px;
            border-bottom: 2px solid #0077cc;
            padding-bottom: 8px;
        }}
        p {{
            font-size: 16px;
            line-height: 1.5;
            margin: 12px 0;
        }}
        strong {{
            color: #004466;
        }}
        .footer {{
            font-size: 12px;
            color: #999;
            margin-top: 30px;
            text-align: center;
        }}
        </style>
    </head>
    <body>
        <div class="container">
        <h1>New Contact Form Submission</h1>

        <p><strong>Name:</strong> {name}</p>
        <p><strong>Email:</strong> {email}</p>
        <p><strong>Phone:</strong> {phone}</p>
        <p><strong>Message:</strong></p>
        <p style="background:#f0f4f8; padding:15px; border-radius:5px; white-space: pre-line;">{message}</p>
        <p><strong>IP Address:</strong> {ip}</p>
        <p><strong>Submitted At:</strong> {submitted_at}</p>

        <div class="footer">
            This message was sent from everscode.com contact form.
        </div>
        </div>
    </body>
    </html>
    "#,
        name = html_escape(&record.name),
        email = html_escape(&record.email),
        phone = html_escape(&record.phone),
        message = html_escape(&record.message),
        ip = html_escape(&record.ip_address),
        submitted_at = submitted_at,
    )
}
