use clap::builder::PossibleValue;
use clap::{Arg, ArgAction, Command, crate_authors, crate_description, crate_name, crate_version};

pub fn build_cli() -> Command {
    let mut args = vec![
        Arg::new("log-level")
            .long("log-level")
            .value_name("LOG_LEVEL")
            .env("KYVERNO_LOG_LEVEL")
            .default_value("info")
            .value_parser([
                PossibleValue::new("trace"),
                PossibleValue::new("debug"),
                PossibleValue::new("info"),
                PossibleValue::new("warn"),
                PossibleValue::new("error"),
            ])
            .help("Log level"),
        Arg::new("log-fmt")
            .long("log-fmt")
            .value_name("LOG_FMT")
            .env("KYVERNO_LOG_FMT")
            .default_value("text")
            .value_parser([PossibleValue::new("text"), PossibleValue::new("json")])
            .help("Log output format"),
        Arg::new("log-no-color")
            .long("log-no-color")
            .env("KYVERNO_LOG_NO_COLOR")
            .action(ArgAction::SetTrue)
            .help("Disable colored output for logs"),
        Arg::new("address")
            .long("addr")
            .value_name("BIND_ADDRESS")
            .default_value("0.0.0.0")
            .env("KYVERNO_BIND_ADDRESS")
            .help("Bind against ADDRESS"),
        Arg::new("port")
            .long("port")
            .value_name("PORT")
            .default_value("9443")
            .env("KYVERNO_PORT")
            .help("Listen on PORT"),
        Arg::new("cert-file")
            .long("cert-file")
            .value_name("CERT_FILE")
            .default_value("")
            .env("KYVERNO_CERT_FILE")
            .help("Path to an X.509 certificate file for HTTPS"),
        Arg::new("key-file")
            .long("key-file")
            .value_name("KEY_FILE")
            .default_value("")
            .env("KYVERNO_KEY_FILE")
            .help("Path to an X.509 private key file for HTTPS"),
        Arg::new("client-ca-file")
            .long("client-ca-file")
            .value_name("CLIENT_CA_FILE")
            .env("KYVERNO_CLIENT_CA_FILE")
            .value_delimiter(',')
            .help("Path to CA certificates used to verify client certificates, comma separated"),
        Arg::new("controller-namespace")
            .long("controller-namespace")
            .value_name("NAMESPACE")
            .env("KYVERNO_NAMESPACE")
            .default_value("kyverno")
            .help("Namespace the controller runs in"),
        Arg::new("controller-service-account")
            .long("controller-service-account")
            .value_name("SERVICE_ACCOUNT")
            .env("KYVERNO_SERVICEACCOUNT_NAME")
            .default_value("kyverno-admission-controller")
            .help("Service account the controller runs as"),
        Arg::new("protect-managed-resources")
            .long("protect-managed-resources")
            .env("KYVERNO_PROTECT_MANAGED_RESOURCES")
            .action(ArgAction::SetTrue)
            .help("Deny changes to resources managed by kyverno unless they are made by the controller"),
        Arg::new("dump-payloads")
            .long("dump-payloads")
            .env("KYVERNO_DUMP_PAYLOADS")
            .action(ArgAction::SetTrue)
            .help("Log admission requests and responses at debug level"),
        Arg::new("enable-metrics")
            .long("enable-metrics")
            .env("KYVERNO_ENABLE_METRICS")
            .action(ArgAction::SetTrue)
            .help("Enable metrics"),
        Arg::new("metrics-config")
            .long("metrics-config")
            .value_name("METRICS_CONFIG_FILE")
            .env("KYVERNO_METRICS_CONFIG")
            .help("YAML file holding the namespaces taken into account by the Kubernetes client metrics"),
        Arg::new("enable-tracing")
            .long("enable-tracing")
            .env("KYVERNO_ENABLE_TRACING")
            .action(ArgAction::SetTrue)
            .help("Export traces to an OpenTelemetry collector"),
        Arg::new("tracing-address")
            .long("tracing-address")
            .value_name("ADDRESS")
            .env("KYVERNO_TRACING_ADDRESS")
            .default_value("127.0.0.1")
            .help("Address of the OpenTelemetry collector"),
        Arg::new("tracing-port")
            .long("tracing-port")
            .value_name("PORT")
            .env("KYVERNO_TRACING_PORT")
            .default_value("4317")
            .help("Port of the OpenTelemetry collector"),
        Arg::new("tracing-creds")
            .long("tracing-creds")
            .value_name("SECRET")
            .env("KYVERNO_TRACING_CREDS")
            .default_value("")
            .help("Secret in the controller namespace holding the CA (ca.crt) of the OpenTelemetry collector, plaintext connection when empty"),
        Arg::new("admission-operations")
            .long("admission-operations")
            .value_name("OPERATIONS")
            .env("KYVERNO_ADMISSION_OPERATIONS")
            .value_delimiter(',')
            .default_values(["CREATE", "UPDATE", "DELETE", "CONNECT"])
            .help("Admission operations checked by the server, comma separated; other operations are allowed right away"),
        Arg::new("ignore-kubernetes-connection-failure")
            .long("ignore-kubernetes-connection-failure")
            .env("KYVERNO_IGNORE_KUBERNETES_CONNECTION_FAILURE")
            .action(ArgAction::SetTrue)
            .help("Do not exit with an error if the Kubernetes connection fails"),
    ];
    args.sort_by(|a, b| a.get_id().cmp(b.get_id()));

    Command::new(crate_name!())
        .author(crate_authors!())
        .version(crate_version!())
        .about(crate_description!())
        .args(args)
}
