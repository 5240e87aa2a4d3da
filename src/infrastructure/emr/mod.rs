mod emr_proxy;

pub use emr_proxy::{EmrProxy, EmrProxyError, ProxyRequest, ProxyResponse, rewrite_location};
