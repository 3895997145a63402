//! RFC 5322 ingestion: raw `.eml` bytes into [`Message`]s, messages into
//! [`Thread`]s.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use mail_parser::{HeaderValue, MessageParser, MimeHeaders};
use tracing::{debug, info, warn};

use crate::error::IngestionError;
use crate::model::{Address, Message, Thread};

/// Subject prefixes dropped when naming a thread.
const REPLY_PREFIXES: &[&str] = &["re:", "fwd:", "fw:"];

/// Parse one raw message.
///
/// A missing Message-ID gets a generated id; a missing Date falls back to
/// the current time. The thread id starts out equal to the message id and
/// is rewritten by [`group_threads`].
pub fn parse_message(raw: &[u8]) -> Result<Message, IngestionError> {
    let parsed = MessageParser::default()
        .parse(raw)
        .ok_or_else(|| IngestionError::Parse("not an RFC 5322 message".into()))?;

    let sender = extract_sender(&parsed)
        .ok_or_else(|| IngestionError::Parse("message has no From address".into()))?;

    let id = parsed
        .message_id()
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let received_at = parsed
        .date()
        .and_then(|d| DateTime::from_timestamp(d.to_timestamp(), 0))
        .unwrap_or_else(|| {
            debug!(id = %id, "No usable Date header, using now");
            Utc::now()
        });

    let mut message = Message::new(
        id.clone(),
        id,
        parsed.subject().unwrap_or_default().trim(),
        sender,
        extract_text(&parsed),
        received_at,
    )
    .with_recipients(extract_addresses(parsed.to()));
    message.cc = extract_addresses(parsed.cc());
    message.in_reply_to = header_ids(parsed.in_reply_to()).into_iter().next();
    message.references = header_ids(parsed.references());

    Ok(message)
}

/// Parse every `*.eml` file in a directory. Unreadable or unparseable
/// files are logged and skipped.
pub fn load_dir(dir: &Path) -> Result<Vec<Message>, IngestionError> {
    let mut paths: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("eml")))
        .collect();
    paths.sort();

    let mut messages = Vec::with_capacity(paths.len());
    for path in paths {
        let raw = match std::fs::read(&path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping unreadable message");
                continue;
            }
        };
        match parse_message(&raw) {
            Ok(message) => messages.push(message),
            Err(e) => warn!(path = %path.display(), error = %e, "Skipping unparseable message"),
        }
    }

    info!(dir = %dir.display(), count = messages.len(), "Loaded messages");
    Ok(messages)
}

/// Group messages into threads by their reply headers.
///
/// The root of a message is the first `References` entry, else the root of
/// its `In-Reply-To` parent, else its own id. Threads come back in order of
/// their earliest message, and each message's `thread_id` is set to the
/// root.
pub fn group_threads(mut messages: Vec<Message>) -> Vec<Thread> {
    messages.sort_by_key(|m| m.received_at);

    let mut roots: HashMap<String, String> = HashMap::new();
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<Message>> = HashMap::new();

    for mut message in messages {
        let root = match message.references.first() {
            Some(first) => roots.get(first).cloned().unwrap_or_else(|| first.clone()),
            None => match &message.in_reply_to {
                Some(parent) => roots.get(parent).cloned().unwrap_or_else(|| parent.clone()),
                None => message.id.clone(),
            },
        };
        roots.insert(message.id.clone(), root.clone());
        message.thread_id = root.clone();

        groups
            .entry(root.clone())
            .or_insert_with(|| {
                order.push(root);
                Vec::new()
            })
            .push(message);
    }

    order
        .into_iter()
        .filter_map(|root| {
            let messages = groups.remove(&root)?;
            let subject = messages
                .first()
                .map(|m| strip_reply_prefixes(&m.subject).to_string())
                .unwrap_or_default();
            let participants = participants(&messages);
            Some(Thread::new(root, subject, participants, messages))
        })
        .collect()
}

/// Every distinct sender and recipient, in order of first appearance.
fn participants(messages: &[Message]) -> Vec<Address> {
    let mut seen = std::collections::HashSet::new();
    messages
        .iter()
        .flat_map(|m| std::iter::once(&m.sender).chain(&m.recipients))
        .filter(|a| seen.insert(a.email.to_lowercase()))
        .cloned()
        .collect()
}

fn strip_reply_prefixes(subject: &str) -> &str {
    let mut rest = subject.trim();
    loop {
        let lower = rest.to_lowercase();
        match REPLY_PREFIXES.iter().find(|p| lower.starts_with(**p)) {
            Some(prefix) => rest = rest[prefix.len()..].trim_start(),
            None => return rest,
        }
    }
}

/// Strip tags from HTML and collapse whitespace.
pub fn strip_html(html: &str) -> String {
    let mut result = String::new();
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => {
                in_tag = false;
                result.push(' ');
            }
            _ if !in_tag => result.push(ch),
            _ => {}
        }
    }
    result.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn extract_sender(parsed: &mail_parser::Message) -> Option<Address> {
    let addr = parsed.from().and_then(|a| a.first())?;
    let email = addr.address()?;
    let address = Address::new(email);
    Some(match addr.name() {
        Some(name) if !name.trim().is_empty() => address.with_name(name.trim()),
        _ => address,
    })
}

/// Plain text part, else the HTML part stripped, else the first text
/// attachment.
fn extract_text(parsed: &mail_parser::Message) -> String {
    if let Some(text) = parsed.body_text(0) {
        return text.to_string();
    }
    if let Some(html) = parsed.body_html(0) {
        return strip_html(html.as_ref());
    }
    for part in parsed.attachments() {
        if let Some(ct) = MimeHeaders::content_type(part)
            && ct.ctype() == "text"
            && let Ok(text) = std::str::from_utf8(part.contents())
        {
            return text.to_string();
        }
    }
    String::new()
}

fn extract_addresses(addr: Option<&mail_parser::Address>) -> Vec<Address> {
    let Some(addr) = addr else {
        return Vec::new();
    };
    let to_address = |a: &mail_parser::Addr<'_>| -> Option<Address> {
        let email = a.address.as_ref()?;
        let address = Address::new(email.as_ref());
        Some(match a.name.as_ref() {
            Some(name) if !name.trim().is_empty() => address.with_name(name.trim()),
            _ => address,
        })
    };
    match addr {
        mail_parser::Address::List(addrs) => addrs.iter().filter_map(&to_address).collect(),
        mail_parser::Address::Group(groups) => groups
            .iter()
            .flat_map(|g| g.addresses.iter().filter_map(&to_address))
            .collect(),
    }
}

fn header_ids(value: &HeaderValue<'_>) -> Vec<String> {
    match value {
        HeaderValue::Text(id) => vec![id.to_string()],
        HeaderValue::TextList(ids) => ids.iter().map(|id| id.to_string()).collect(),
        _ => Vec::new(),
    }
}
