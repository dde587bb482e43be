pub(crate) mod forecast;
pub(crate) mod health;
pub(crate) mod reference;
pub(crate) mod series;
pub(crate) mod simulation;
