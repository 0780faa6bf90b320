//! Mock feed data and the producers that stream it.
//!
//! Each producer simulates a backend with its own latency per record, so
//! the three streams interleave on the wire the way real fetches would.

use std::time::Duration;

use mux_stream::{Payload, ProducerError, ProducerScope};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

const POST_LATENCY: Duration = Duration::from_millis(500);
const COMMENT_LATENCY: Duration = Duration::from_millis(600);
const USER_LATENCY: Duration = Duration::from_millis(700);

#[derive(Debug, Clone, Serialize)]
pub struct Post {
    pub id: String,
    pub data: String,
    pub comments: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Comment {
    pub id: String,
    pub text: String,
    pub user: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: String,
    pub name: String,
}

fn posts() -> Vec<Post> {
    (1..=10)
        .map(|i| Post {
            id: format!("p{i}"),
            data: if i % 2 == 1 { "Hello" } else { "World" }.to_string(),
            comments: vec![format!("c{}", 2 * i - 1), format!("c{}", 2 * i)],
        })
        .collect()
}

fn comments() -> Vec<Comment> {
    (1..=20)
        .map(|i| Comment {
            id: format!("c{i}"),
            text: match i {
                1 => "Great!",
                2 => "Good job!",
                4 => "Awesome!",
                _ => "Thanks!",
            }
            .to_string(),
            user: format!("u{i}"),
        })
        .collect()
}

fn users() -> Vec<User> {
    const NAMES: [&str; 20] = [
        "Alice", "Bob", "Charlie", "David", "Eve", "Frank", "George", "Hannah", "Isaac", "James",
        "John", "Kate", "Liam", "Mia", "Noah", "Olivia", "Patrick", "Quinn", "Ryan", "Sarah",
    ];
    NAMES
        .iter()
        .enumerate()
        .map(|(i, name)| User {
            id: format!("u{}", i + 1),
            name: (*name).to_string(),
        })
        .collect()
}

/// Streams one post per tick.
pub async fn stream_posts(scope: ProducerScope) -> Result<(), ProducerError> {
    for post in posts() {
        pace(&scope, POST_LATENCY).await?;
        let Some(payload) = tagged_record("post", [(post.id.clone(), post)]) else {
            continue;
        };
        scope.send(payload).await?;
    }
    Ok(())
}

/// Streams comments two at a time.
pub async fn stream_comments(scope: ProducerScope) -> Result<(), ProducerError> {
    let all = comments();
    for pair in all.chunks(2) {
        pace(&scope, COMMENT_LATENCY).await?;
        let entries = pair.iter().map(|c| (c.id.clone(), c.clone()));
        let Some(payload) = tagged_record("comment", entries) else {
            continue;
        };
        scope.send(payload).await?;
    }
    Ok(())
}

/// Streams one user per tick.
pub async fn stream_users(scope: ProducerScope) -> Result<(), ProducerError> {
    for user in users() {
        pace(&scope, USER_LATENCY).await?;
        let Some(payload) = tagged_record("user", [(user.id.clone(), user)]) else {
            continue;
        };
        scope.send(payload).await?;
    }
    Ok(())
}

/// Sleep between records, bailing out promptly if the session is
/// cancelled mid-wait.
async fn pace(scope: &ProducerScope, latency: Duration) -> Result<(), ProducerError> {
    tokio::select! {
        _ = scope.cancelled() => Err(ProducerError::Cancelled),
        _ = tokio::time::sleep(latency) => Ok(()),
    }
}

/// Build a `{"type": kind, "<id>": record, ...}` JSON payload. A record
/// that fails to serialize is logged and dropped, not fatal.
fn tagged_record<T: Serialize>(
    kind: &str,
    entries: impl IntoIterator<Item = (String, T)>,
) -> Option<Payload> {
    let mut map = Map::new();
    map.insert("type".to_string(), Value::String(kind.to_string()));
    for (id, entry) in entries {
        match serde_json::to_value(&entry) {
            Ok(value) => {
                map.insert(id, value);
            }
            Err(err) => {
                warn!(error = %err, kind, "skipping unserializable record");
                return None;
            }
        }
    }
    match Payload::json(&map) {
        Ok(payload) => Some(payload),
        Err(err) => {
            warn!(error = %err, kind, "skipping unserializable record");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_data_is_consistent() {
        let posts = posts();
        let comments = comments();
        let users = users();
        assert_eq!(posts.len(), 10);
        assert_eq!(comments.len(), 20);
        assert_eq!(users.len(), 20);

        // Every comment referenced by a post exists, and every comment's
        // author exists.
        for post in &posts {
            for cid in &post.comments {
                assert!(comments.iter().any(|c| &c.id == cid));
            }
        }
        for comment in &comments {
            assert!(users.iter().any(|u| u.id == comment.user));
        }
    }

    #[test]
    fn test_tagged_record_shape() {
        let user = User {
            id: "u1".to_string(),
            name: "Alice".to_string(),
        };
        let payload = tagged_record("user", [(user.id.clone(), user)]).unwrap();
        let value: Value = serde_json::from_slice(payload.body()).unwrap();
        assert_eq!(value["type"], "user");
        assert_eq!(value["u1"]["name"], "Alice");
    }
}
