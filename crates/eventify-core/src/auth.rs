use std::thread;
use std::time::Duration;

use anyhow::bail;
use tracing::{debug, info};

use crate::session::User;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

/// The authentication collaborator. The shipped implementation is the mock
/// backend; a real deployment would put an HTTP client behind this trait
/// with the same shapes.
pub trait AuthService {
    fn login(&self, email: &str, password: &str) -> anyhow::Result<AuthResponse>;
    fn register(&self, name: &str, email: &str, password: &str) -> anyhow::Result<AuthResponse>;
    fn logout(&self) -> anyhow::Result<String>;
}

const LOGIN_DELAY: Duration = Duration::from_millis(1000);
const REGISTER_DELAY: Duration = Duration::from_millis(1000);
const LOGOUT_DELAY: Duration = Duration::from_millis(500);

/// Simulated backend: accepts one fixed password, answers after a fixed
/// delay. Each call runs to completion on the calling thread, so a response
/// can never land after its caller is gone.
#[derive(Debug, Clone)]
pub struct MockAuth {
    latency_scale: f64,
}

impl Default for MockAuth {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAuth {
    pub fn new() -> Self {
        Self { latency_scale: 1.0 }
    }

    /// No simulated delays; tests use this.
    pub fn instant() -> Self {
        Self { latency_scale: 0.0 }
    }

    fn simulate_latency(&self, base: Duration) {
        let scaled = base.mul_f64(self.latency_scale);
        if !scaled.is_zero() {
            debug!(millis = scaled.as_millis() as u64, "simulating backend latency");
            thread::sleep(scaled);
        }
    }
}

impl AuthService for MockAuth {
    fn login(&self, email: &str, password: &str) -> anyhow::Result<AuthResponse> {
        self.simulate_latency(LOGIN_DELAY);

        if email.trim().is_empty() || password != "123456" {
            bail!("Invalid email or password");
        }

        info!(email, "mock login accepted");
        Ok(AuthResponse {
            token: "mock-token-123".to_string(),
            user: User {
                id: "1".to_string(),
                email: email.to_string(),
                name: "Test User".to_string(),
            },
        })
    }

    fn register(&self, name: &str, email: &str, _password: &str) -> anyhow::Result<AuthResponse> {
        self.simulate_latency(REGISTER_DELAY);

        info!(email, "mock registration accepted");
        Ok(AuthResponse {
            token: "mock-token-456".to_string(),
            user: User {
                id: "2".to_string(),
                email: email.to_string(),
                name: name.to_string(),
            },
        })
    }

    fn logout(&self) -> anyhow::Result<String> {
        self.simulate_latency(LOGOUT_DELAY);
        Ok("Logged out successfully".to_string())
    }
}
