use std::fmt::Debug;

use tower_cookies::{Cookie, Cookies};

/// The cookie jar a store reads from and writes to.
///
/// Writes must be visible to later reads of the same jar, so a value written earlier in a request
/// is what a read later in that request sees.
pub trait CookieTransport: Debug {
    fn get(&self, name: &str) -> Option<String>;
    fn add(&self, cookie: Cookie<'static>);
    fn remove(&self, cookie: Cookie<'static>);
}

impl CookieTransport for Cookies {
    fn get(&self, name: &str) -> Option<String> {
        Cookies::get(self, name).map(|cookie| cookie.value().to_string())
    }

    fn add(&self, cookie: Cookie<'static>) {
        Cookies::add(self, cookie);
    }

    fn remove(&self, cookie: Cookie<'static>) {
        Cookies::remove(self, cookie);
    }
}
