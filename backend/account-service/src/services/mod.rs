/// Business logic services
pub mod account_mail;
pub mod affiliate;
pub mod mailer;

pub use account_mail::{AccountMailer, MailSettings};
pub use affiliate::{SponsorRequest, SponsorResolution, SponsorResolver};
pub use mailer::{Address, Email, LogMailer, Mailer, SmtpMailer};
