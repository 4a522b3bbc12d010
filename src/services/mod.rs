pub mod captcha_holder;
pub mod post_form;
pub mod reply_classifier;

pub use captcha_holder::{CaptchaHolder, CaptchaToken, Clock, ManualClock, SystemClock};
pub use post_form::{build_file_part, build_multipart, build_post_fields, CaptchaParam};
pub use reply_classifier::{classify, THREAD_NOT_FOUND_MESSAGE};
