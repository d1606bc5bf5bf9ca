pub mod drupal_server;
