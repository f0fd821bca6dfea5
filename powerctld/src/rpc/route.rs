use crate::rpc::api::Method;
use ahash::AHashMap;

/// A dot-separated method name router.
#[derive(Debug, Default)]
pub struct Router {
    map: AHashMap<&'static str, Route>,
}
impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, key: &'static str, route: Method) -> Self {
        self.map.insert(key, route.into());
        self
    }

    pub fn nest(mut self, key: &'static str, nest: Router) -> Self {
        self.map.insert(key, nest.into());
        self
    }

    pub fn get_method(&self, mut key: &str) -> Option<Method> {
        let mut router = self;
        loop {
            match key.split_once('.') {
                Some((head, rest)) => {
                    router = match router.map.get(head) {
                        Some(Route::Router(x)) => x,
                        _ => break None,
                    };
                    key = rest;
                }
                None => match router.map.get(key) {
                    Some(Route::Method(x)) => break Some(*x),
                    _ => break None,
                },
            }
        }
    }
}

#[derive(Debug)]
pub enum Route {
    Method(Method),
    Router(Box<Router>),
}
impl From<Method> for Route {
    fn from(value: Method) -> Self {
        Self::Method(value)
    }
}
impl From<Router> for Route {
    fn from(value: Router) -> Self {
        Self::Router(Box::new(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::api;

    #[test]
    fn nested_lookup() {
        let router = api::root_router();
        assert!(router.get_method("host.query").is_some());
        assert!(router.get_method("host.request_transition").is_some());
        assert!(router.get_method("buttons.set_mask").is_some());
        assert!(router.get_method("host").is_none());
        assert!(router.get_method("host.reboot").is_none());
        assert!(router.get_method("host.query.deep").is_none());
    }
}
