//! Password login and session tokens
//!
//! Tokens are random and only live in memory, so a daemon restart logs
//! everyone out. At most [`MAX_SESSIONS`] are kept; issuing one more drops
//! the oldest.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use parking_lot::RwLock;
use uuid::Uuid;

pub const MAX_SESSIONS: usize = 256;

#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub enabled: bool,
    pub password: String,
}

#[derive(Debug, Default)]
struct Tokens {
    live: HashSet<String>,
    // issue order, oldest first
    order: VecDeque<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Sessions {
    tokens: Arc<RwLock<Tokens>>,
}

impl Sessions {
    /// Issue a new token, evicting the oldest one when full.
    pub fn issue(&self) -> String {
        let token = Uuid::new_v4().simple().to_string();
        let mut tokens = self.tokens.write();
        while tokens.live.len() >= MAX_SESSIONS {
            match tokens.order.pop_front() {
                Some(oldest) => {
                    tokens.live.remove(&oldest);
                }
                None => break,
            }
        }
        tokens.live.insert(token.clone());
        tokens.order.push_back(token.clone());
        token
    }

    pub fn is_valid(&self, token: &str) -> bool {
        !token.is_empty() && self.tokens.read().live.contains(token)
    }

    /// Forget `token`. Returns whether it was live.
    pub fn revoke(&self, token: &str) -> bool {
        let mut tokens = self.tokens.write();
        if !tokens.live.remove(token) {
            return false;
        }
        tokens.order.retain(|t| t != token);
        true
    }

    pub fn len(&self) -> usize {
        self.tokens.read().live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
