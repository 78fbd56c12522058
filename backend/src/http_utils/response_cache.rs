//! In-process cache of option list responses, keyed by the sha256 of the
//! request url. Option lists do not change within a session.

use std::collections::HashMap;
use std::sync::{LazyLock, Mutex};

static RESPONSE_CACHE: LazyLock<Mutex<HashMap<String, String>>> = LazyLock::new(|| Mutex::new(HashMap::new()));

pub fn cache_key(url: &str) -> String {
    sha256::digest(url)
}

pub fn get_cached_response(key: &str) -> Option<String> {
    let cache = RESPONSE_CACHE.lock().ok()?;
    cache.get(key).cloned()
}

pub fn insert_cache(key: String, response: String) -> anyhow::Result<()> {
    let mut cache = RESPONSE_CACHE.lock().map_err(|_| anyhow::anyhow!("response cache poisoned"))?;
    cache.insert(key, response);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_round_trip() {
        let key = cache_key("http://invenio.test/facet/year/1?limit=20");
        assert_eq!(key.len(), 64);
        assert!(get_cached_response(&key).is_none());
        insert_cache(key.clone(), "{\"facet\": []}".to_string()).unwrap();
        assert_eq!(get_cached_response(&key).as_deref(), Some("{\"facet\": []}"));
    }
}
