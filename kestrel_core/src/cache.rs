//! Process-wide texture cache: identity key → uploaded GPU texture.
//!
//! One entry per distinct key, inserted on first encounter and shared by
//! every model loaded in this process. Lookup and insertion go through a
//! single mutex so two loads racing on the same key cannot upload the
//! image twice.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, OnceLock};

use log::debug;

use crate::error::Result;
use crate::texture::Texture;

fn entries() -> MutexGuard<'static, HashMap<String, Texture>> {
    static CACHE: OnceLock<Mutex<HashMap<String, Texture>>> = OnceLock::new();

    CACHE
        .get_or_init(|| Mutex::new(HashMap::new()))
        .lock()
        .expect("texture cache mutex poisoned")
}

/// Returns the cached texture for `key`, if any. No GPU work.
pub fn lookup(key: &str) -> Option<Texture> {
    entries().get(key).cloned()
}

/// Returns the texture under `key`, running `producer` to decode and
/// upload it only when the cache has no entry yet.
///
/// The lock is held across the producer call, which makes the whole
/// lookup-or-insert atomic. A failing producer leaves the cache untouched;
/// the next call for the same key gets to retry.
pub fn get_or_insert_with<F>(key: &str, producer: F) -> Result<Texture>
where
    F: FnOnce() -> Result<Texture>,
{
    let mut entries = entries();

    if let Some(tex) = entries.get(key) {
        debug!("texture cache hit: {}", key);
        return Ok(tex.clone());
    }

    debug!("texture cache miss: {}", key);
    let tex = producer()?;
    entries.insert(key.to_owned(), tex.clone());

    Ok(tex)
}

/// Deletes every cached GL texture and empties the cache. Call once, at
/// shutdown, with the GL context still current.
pub fn release_all() {
    for (_, tex) in entries().drain() {
        unsafe {
            gl::DeleteTextures(1, &tex.id);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::error::Error;
    use crate::texture::TextureRole;

    // The cache is process state shared by every test in this binary, so
    // each test keys its entries under its own name.

    fn fake(id: u32, key: &str) -> Texture {
        Texture {
            id,
            role: TextureRole::Diffuse,
            key: key.to_owned(),
        }
    }

    #[test]
    fn producer_runs_exactly_once_per_key() {
        let mut runs = 0;

        for _ in 0..3 {
            let tex = get_or_insert_with("test://runs-once", || {
                runs += 1;
                Ok(fake(7, "test://runs-once"))
            })
            .unwrap();

            assert_eq!(tex.id, 7);
        }

        assert_eq!(runs, 1);
    }

    #[test]
    fn repeated_gets_share_one_handle() {
        let first = get_or_insert_with("test://shared", || Ok(fake(11, "test://shared"))).unwrap();
        let second = get_or_insert_with("test://shared", || Ok(fake(99, "test://shared"))).unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(lookup("test://shared").unwrap().id, first.id);
    }

    #[test]
    fn lookup_of_absent_key_is_none() {
        assert!(lookup("test://never-inserted").is_none());
    }

    #[test]
    fn failed_producer_inserts_nothing() {
        let result = get_or_insert_with("test://failing", || {
            Err(Error::TextureDecode {
                key: "test://failing".to_owned(),
                reason: "bad bytes".to_owned(),
            })
        });

        assert!(result.is_err());
        assert!(lookup("test://failing").is_none());

        // The next producer for the same key gets its chance.
        let tex = get_or_insert_with("test://failing", || Ok(fake(9, "test://failing"))).unwrap();
        assert_eq!(tex.id, 9);
    }
}
