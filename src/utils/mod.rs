mod fetch;
pub use fetch::*;

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;

    use bytes::Bytes;
    use hashbrown::HashMap;

    use super::{FetchOutcome, Fetcher, Resp};

    /// Serves canned bodies, everything else is a 404.
    #[derive(Default)]
    pub struct StaticFetcher {
        bodies: HashMap<String, (Option<&'static str>, String)>,
        failing: Vec<String>,
        pub requests: RefCell<Vec<String>>,
    }

    impl StaticFetcher {
        pub fn with(mut self, url: &str, content_type: Option<&'static str>, body: &str) -> Self {
            self.bodies
                .insert(url.to_string(), (content_type, body.to_string()));
            self
        }

        pub fn failing(mut self, url: &str) -> Self {
            self.failing.push(url.to_string());
            self
        }

        pub fn request_count(&self) -> usize {
            self.requests.borrow().len()
        }
    }

    impl Fetcher for StaticFetcher {
        fn fetch(&self, url: &str, _accept: &str) -> FetchOutcome {
            self.requests.borrow_mut().push(url.to_string());
            if self.failing.iter().any(|x| x == url) {
                return FetchOutcome::Failed("connection refused".into());
            }
            match self.bodies.get(url) {
                Some((content_type, body)) => FetchOutcome::Found(Resp {
                    content_type: content_type.and_then(|x| x.parse().ok()),
                    body: Bytes::from(body.clone()),
                    status: 200,
                }),
                None => FetchOutcome::NotFound,
            }
        }
    }
}
