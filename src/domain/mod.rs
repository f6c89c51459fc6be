use error::Error;

pub mod archiver;
pub mod error;
pub mod event;
pub mod resource;
pub mod task;
pub mod user;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    pub const SITE_URL: &str = "https://example.org";
    pub const SITE_ID: &str = "default";
    pub const SITE_USER_APIKEY: &str = "1f1a5a4b-2b1e-4a4f-9d6e-5c0b8e1f0c11";
    pub const USER_APIKEY: &str = "6d1b7c3e-0e55-4a5e-a8a4-3f9b0d2c7e42";
}
