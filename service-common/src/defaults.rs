#[inline]
pub fn health_bind_addr() -> String {
    "127.0.0.1:9090".into()
}

#[inline]
pub fn health_workers() -> usize {
    1
}
