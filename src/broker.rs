pub mod rules;
pub mod tinkoff;
