mod helpers;
mod provisioning_test;
mod records_api_test;
mod serve_test;
