pub mod id_token;
