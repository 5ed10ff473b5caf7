pub mod divisions;
pub mod export;
pub mod formations;
pub mod game;
pub mod goalies;
pub mod ingest;
pub mod ledger;
pub mod names;
pub mod powerplay;
