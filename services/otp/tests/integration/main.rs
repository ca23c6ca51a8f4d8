mod helpers;

mod http_test;
