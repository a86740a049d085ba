//! Shared cache-control policies for HTTP handlers.

/// Owner-scoped responses must always be revalidated before reuse.
pub const PRIVATE_NO_CACHE_MUST_REVALIDATE: &str = "private, no-cache, must-revalidate";

/// Cache-control header for owner-scoped API responses.
pub const fn private_no_cache_header() -> (&'static str, &'static str) {
    ("Cache-Control", PRIVATE_NO_CACHE_MUST_REVALIDATE)
}

/// Cache-control header for probes, which must never be cached.
pub const fn no_store_header() -> (&'static str, &'static str) {
    ("Cache-Control", "no-store")
}
