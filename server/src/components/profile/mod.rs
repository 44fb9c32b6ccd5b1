pub mod profile_card;

pub use profile_card::ProfileCard;
