pub mod dispatcher;
pub mod whatsapp;
