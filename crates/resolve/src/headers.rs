use reelfetch_config::Headers;
use reelfetch_extract::models::Shortcode;

const USER_AGENT: &str = "User-Agent";

/// Request headers shared by every strategy, plus the `User-Agent` pool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet {
    base: Vec<(String, String)>,
    user_agents: Vec<String>,
}

impl HeaderSet {
    pub fn new(base: &Headers, user_agents: &[String]) -> Self {
        Self {
            base: base.iter().map(|(name, value)| (name.clone(), value.clone())).collect(),
            user_agents: user_agents.iter().filter(|ua| !ua.trim().is_empty()).cloned().collect(),
        }
    }

    /// Headers for one request: the shared set, overridden by the strategy's
    /// own headers (names compared case-insensitively).
    ///
    /// Without a configured `User-Agent`, one is picked from the pool by the
    /// shortcode, so a given post always goes out with the same agent.
    pub fn for_request(&self, strategy: &Headers, shortcode: &Shortcode) -> Vec<(String, String)> {
        let mut headers = self.base.clone();
        for (name, value) in strategy {
            match headers.iter_mut().find(|(existing, _)| existing.eq_ignore_ascii_case(name)) {
                Some(existing) => existing.1 = value.clone(),
                None => headers.push((name.clone(), value.clone())),
            }
        }
        let has_user_agent = headers.iter().any(|(name, _)| name.eq_ignore_ascii_case(USER_AGENT));
        if !has_user_agent && let Some(agent) = self.pick_user_agent(shortcode) {
            headers.push((USER_AGENT.to_string(), agent.to_string()));
        }
        headers
    }

    fn pick_user_agent(&self, shortcode: &Shortcode) -> Option<&str> {
        if self.user_agents.is_empty() {
            return None;
        }
        let digest = blake3::hash(shortcode.as_str().as_bytes());
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest.as_bytes()[..8]);
        let index = u64::from_le_bytes(prefix) % self.user_agents.len() as u64;
        self.user_agents.get(index as usize).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shortcode(value: &str) -> Shortcode {
        value.parse().unwrap()
    }

    fn headers(pairs: &[(&str, &str)]) -> Headers {
        pairs.iter().map(|(n, v)| (n.to_string(), v.to_string())).collect()
    }

    fn agents() -> Vec<String> {
        vec!["agent-a".to_string(), "agent-b".to_string(), "agent-c".to_string()]
    }

    #[test]
    fn test_strategy_headers_override_base() {
        let set = HeaderSet::new(&headers(&[("Accept", "*/*"), ("Accept-Language", "en")]), &[]);
        let merged = set.for_request(&headers(&[("accept", "application/json"), ("X-IG-App-ID", "1")]), &shortcode("ABCDEFGHIJ"));
        assert_eq!(
            merged,
            vec![
                ("Accept".to_string(), "application/json".to_string()),
                ("Accept-Language".to_string(), "en".to_string()),
                ("X-IG-App-ID".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn test_user_agent_is_deterministic() {
        let set = HeaderSet::new(&Headers::new(), &agents());
        let first = set.for_request(&Headers::new(), &shortcode("ABCDEFGHIJ"));
        let second = set.for_request(&Headers::new(), &shortcode("ABCDEFGHIJ"));
        assert_eq!(first, second);
        let (name, agent) = &first[0];
        assert_eq!(name, USER_AGENT);
        assert!(agents().contains(agent));
    }

    #[test]
    fn test_configured_user_agent_wins() {
        let set = HeaderSet::new(&Headers::new(), &agents());
        let merged = set.for_request(&headers(&[("user-agent", "Instagram 269")]), &shortcode("ABCDEFGHIJ"));
        assert_eq!(merged, vec![("user-agent".to_string(), "Instagram 269".to_string())]);
    }

    #[test]
    fn test_empty_pool() {
        let set = HeaderSet::new(&Headers::new(), &[]);
        assert!(set.for_request(&Headers::new(), &shortcode("ABCDEFGHIJ")).is_empty());
    }
}
