use actix_cors::Cors;

pub fn create_cors() -> Cors {
    Cors::default()
        .allowed_origin_fn(|_, _req_head| {
            // the web front end is served from several preview domains
            true
        })
        .allowed_methods(vec!["GET", "POST", "DELETE", "OPTIONS"])
        // identity travels in a custom header
        .allow_any_header()
        .max_age(3600)
}
