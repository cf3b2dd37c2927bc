//! SNS `Publish` over HTTPS.
//!
//! One form-encoded POST per message, signed with SigV4. The response is XML;
//! the two elements we care about are pulled out by name rather than parsed.

use chrono::Utc;
use petclaims_common::services::BoxFuture;
use petclaims_common::HTTP_CLIENT;
use petclaims_config::env_vars::SECRET_FROM_ENV;
use petclaims_config::SmsConfig;
use tracing::{debug, error};

use crate::error::SmsError;
use crate::service::SmsPublisher;
use crate::sigv4::{self, SignableRequest, SigningParams};

const SERVICE: &str = "sns";
const API_VERSION: &str = "2010-03-31";
const CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=utf-8";

/// Publishes straight to a phone number (no topic).
#[derive(Debug, Clone)]
pub struct SnsPublisher {
    endpoint: String,
    host: String,
    region: String,
    access_key_id: String,
    secret_access_key: String,
    session_token: Option<String>,
    sender_id: Option<String>,
}

fn is_unset(value: &str) -> bool {
    value.trim().is_empty() || value == SECRET_FROM_ENV
}

impl SnsPublisher {
    pub fn from_config(config: &SmsConfig) -> Result<Self, SmsError> {
        if is_unset(&config.region) {
            return Err(SmsError::ConfigError("sms.region is not set".to_string()));
        }
        if is_unset(&config.access_key_id) || is_unset(&config.secret_access_key) {
            return Err(SmsError::ConfigError(
                "AWS access key id and secret access key are required".to_string(),
            ));
        }

        let endpoint = config
            .endpoint
            .clone()
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| format!("https://sns.{}.amazonaws.com/", config.region));
        let url = reqwest::Url::parse(&endpoint)
            .map_err(|e| SmsError::ConfigError(format!("invalid SNS endpoint '{}': {}", endpoint, e)))?;
        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => {
                return Err(SmsError::ConfigError(format!(
                    "SNS endpoint '{}' has no host",
                    endpoint
                )))
            }
        };

        Ok(Self {
            endpoint,
            host,
            region: config.region.clone(),
            access_key_id: config.access_key_id.clone(),
            secret_access_key: config.secret_access_key.clone(),
            session_token: config.session_token.clone().filter(|t| !is_unset(t)),
            sender_id: config.sender_id.clone().filter(|s| !s.trim().is_empty()),
        })
    }

    /// The form body for one publish call.
    pub fn publish_body(&self, phone_number: &str, message: &str) -> Result<String, SmsError> {
        let mut params: Vec<(&str, &str)> = vec![
            ("Action", "Publish"),
            ("Version", API_VERSION),
            ("PhoneNumber", phone_number),
            ("Message", message),
            ("MessageAttributes.entry.1.Name", "AWS.SNS.SMS.SMSType"),
            ("MessageAttributes.entry.1.Value.DataType", "String"),
            ("MessageAttributes.entry.1.Value.StringValue", "Transactional"),
        ];
        if let Some(sender_id) = self.sender_id.as_deref() {
            params.push(("MessageAttributes.entry.2.Name", "AWS.SNS.SMS.SenderID"));
            params.push(("MessageAttributes.entry.2.Value.DataType", "String"));
            params.push(("MessageAttributes.entry.2.Value.StringValue", sender_id));
        }

        serde_urlencoded::to_string(&params).map_err(|e| SmsError::EncodingError(e.to_string()))
    }

    async fn publish_inner(&self, phone_number: &str, message: &str) -> Result<String, SmsError> {
        let body = self.publish_body(phone_number, message)?;

        let params = SigningParams {
            access_key_id: &self.access_key_id,
            secret_access_key: &self.secret_access_key,
            session_token: self.session_token.as_deref(),
            region: &self.region,
            service: SERVICE,
        };
        let content_headers = [("content-type", CONTENT_TYPE)];
        let request = SignableRequest {
            method: "POST",
            host: &self.host,
            path: "/",
            headers: &content_headers,
            payload: body.as_bytes(),
        };
        let auth_headers = sigv4::sign(&params, &request, Utc::now())?;

        debug!("POST {} (Publish)", self.endpoint);
        let mut builder = HTTP_CLIENT
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, CONTENT_TYPE);
        for (name, value) in auth_headers {
            builder = builder.header(name, value);
        }

        let response = builder.body(body).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = extract_element(&text, "Message").unwrap_or_else(|| text.trim().to_string());
            error!("SNS returned {}: {}", status, message);
            return Err(SmsError::ApiError {
                status_code: status.as_u16(),
                message,
            });
        }

        extract_element(&text, "MessageId").ok_or_else(|| {
            SmsError::ResponseError(format!("no MessageId in response: {}", text.trim()))
        })
    }
}

impl SmsPublisher for SnsPublisher {
    fn publish<'a>(&'a self, phone_number: &'a str, message: &'a str) -> BoxFuture<'a, String, SmsError> {
        Box::pin(self.publish_inner(phone_number, message))
    }
}

/// Text of the first `<name>…</name>` element.
fn extract_element(xml: &str, name: &str) -> Option<String> {
    let open = format!("<{}>", name);
    let close = format!("</{}>", name);
    let start = xml.find(&open)? + open.len();
    let end = start + xml[start..].find(&close)?;
    Some(unescape_xml(xml[start..end].trim()))
}

/// The five predefined XML entities. `&amp;` goes last so `&amp;lt;` stays `&lt;`.
fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
