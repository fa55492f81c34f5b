pub mod contact;
pub mod post;
pub mod subscription;
pub mod suggestion;
pub mod user;

pub use contact::Contact;
pub use post::{NewPost, Post, PostCategory, PostWithAuthor};
pub use subscription::{NewSubscription, Subscription};
pub use suggestion::{Suggestion, SuggestionCategory, SuggestionWithAuthor};
pub use user::User;
