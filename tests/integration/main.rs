mod helpers;
mod test_binary;
mod test_probes;
mod test_reporting;
mod test_session;
