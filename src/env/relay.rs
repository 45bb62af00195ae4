use {serde::Deserialize, std::time::Duration, url::Url};

/// Upstream bundler and paymaster endpoints.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub url: Url,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Paymaster used when a request carries no `paymasterService` capability.
    #[serde(default)]
    pub paymaster_url: Option<Url>,
    /// Hosts a request may name in its `paymasterService` capability, in
    /// addition to the host of `paymaster_url`. Comma separated.
    #[serde(default)]
    pub paymaster_hosts: Vec<String>,
}

fn default_timeout_secs() -> u64 {
    20
}

impl RelayConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn allows_paymaster(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        let configured = self
            .paymaster_url
            .as_ref()
            .and_then(Url::host_str)
            .is_some_and(|configured| configured.eq_ignore_ascii_case(host));
        configured
            || self
                .paymaster_hosts
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(host))
    }
}
