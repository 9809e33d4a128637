pub mod location;
pub mod observation;
pub mod record;
pub mod weather_condition;
