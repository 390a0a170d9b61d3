//! Session handling on top of the remote API's token authentication.

mod cookie;
mod log_in;
mod log_out;
mod middleware;
mod redirect;
mod register;
mod token;

pub use cookie::{DEFAULT_COOKIE_DURATION, invalidate_auth_cookie, set_auth_cookie};
pub use log_in::{get_log_in_page, post_log_in};
pub use log_out::get_log_out;
pub use middleware::{auth_guard, auth_guard_hx};
pub use redirect::{hx_current_path, normalize_redirect_url};
pub use register::{get_register_page, post_register};

#[cfg(test)]
pub use cookie::COOKIE_TOKEN;
