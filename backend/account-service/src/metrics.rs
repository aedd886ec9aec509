use actix_web::HttpResponse;
use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, TextEncoder};

/// Handler that serialises Prometheus metrics in text format.
pub async fn metrics_handler() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => HttpResponse::Ok()
            .content_type(encoder.format_type())
            .body(buffer),
        Err(err) => HttpResponse::InternalServerError().body(err.to_string()),
    }
}

/// Force registration of every account counter so they show up at zero.
pub fn init() {
    let _ = &*LOGIN_REQUESTS_TOTAL;
    let _ = &*LOGIN_FAILURES_TOTAL;
    let _ = &*SIGNUPS_TOTAL;
    let _ = &*EMAILS_SENT_TOTAL;
    let _ = &*EMAIL_FAILURES_TOTAL;
}

fn counter(name: &str, help: &str) -> IntCounter {
    IntCounter::new(name, help)
        .and_then(|c| {
            prometheus::default_registry().register(Box::new(c.clone()))?;
            Ok(c)
        })
        .unwrap_or_else(|e| {
            tracing::error!("failed to register {} counter: {}", name, e);
            IntCounter::new(format!("unregistered_{}", name), help).expect("fallback counter")
        })
}

fn counter_vec(name: &str, help: &str, labels: &[&str]) -> IntCounterVec {
    IntCounterVec::new(Opts::new(name, help), labels)
        .and_then(|c| {
            prometheus::default_registry().register(Box::new(c.clone()))?;
            Ok(c)
        })
        .unwrap_or_else(|e| {
            tracing::error!("failed to register {} counter: {}", name, e);
            IntCounterVec::new(Opts::new(format!("unregistered_{}", name), help), labels)
                .expect("fallback counter")
        })
}

/// Login form submissions
static LOGIN_REQUESTS_TOTAL: Lazy<IntCounter> =
    Lazy::new(|| counter("account_login_requests_total", "Total number of login attempts"));

/// Login attempts rejected for bad credentials or inactive accounts
static LOGIN_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    counter(
        "account_login_failures_total",
        "Total number of failed login attempts",
    )
});

static SIGNUPS_TOTAL: Lazy<IntCounter> =
    Lazy::new(|| counter("account_signups_total", "Total number of created accounts"));

static EMAILS_SENT_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    counter_vec(
        "account_emails_sent_total",
        "Account emails handed to the transport, by kind",
        &["kind"],
    )
});

static EMAIL_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    counter_vec(
        "account_email_failures_total",
        "Account emails the transport rejected, by kind",
        &["kind"],
    )
});

#[inline]
pub fn inc_login_requests() {
    LOGIN_REQUESTS_TOTAL.inc();
}

#[inline]
pub fn inc_login_failures() {
    LOGIN_FAILURES_TOTAL.inc();
}

#[inline]
pub fn inc_signups() {
    SIGNUPS_TOTAL.inc();
}

pub fn inc_emails_sent(kind: &str) {
    EMAILS_SENT_TOTAL.with_label_values(&[kind]).inc();
}

pub fn inc_email_failures(kind: &str) {
    EMAIL_FAILURES_TOTAL.with_label_values(&[kind]).inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_counters_are_labelled_by_kind() {
        let before = EMAILS_SENT_TOTAL.with_label_values(&["contact"]).get();
        inc_emails_sent("contact");
        assert_eq!(
            EMAILS_SENT_TOTAL.with_label_values(&["contact"]).get(),
            before + 1
        );
    }

    #[actix_web::test]
    async fn handler_exposes_registered_counters() {
        init();
        inc_signups();

        let resp = metrics_handler().await;
        assert!(resp.status().is_success());

        let body = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("account_signups_total"));
    }
}
