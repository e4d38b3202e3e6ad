mod contact;
mod contact_client;
mod health_check;
