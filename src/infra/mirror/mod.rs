pub mod http_mirror_client;
