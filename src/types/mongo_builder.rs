use std::collections::BTreeMap;

/// MongoDB 连接URI构建器
///
/// 从主机、端口、认证信息等零散配置拼出标准连接串，用户名和密码会做URL编码
#[derive(Debug, Clone)]
pub struct MongoDbConnectionBuilder {
    host: String,
    port: u16,
    database: String,
    username: Option<String>,
    password: Option<String>,
    auth_source: Option<String>,
    direct_connection: bool,
    options: BTreeMap<String, String>,
}

impl MongoDbConnectionBuilder {
    /// 创建新的MongoDB连接构建器
    pub fn new<H: Into<String>, D: Into<String>>(host: H, port: u16, database: D) -> Self {
        Self {
            host: host.into(),
            port,
            database: database.into(),
            username: None,
            password: None,
            auth_source: None,
            direct_connection: false,
            options: BTreeMap::new(),
        }
    }

    /// 设置用户名和密码
    pub fn with_auth<U: Into<String>, P: Into<String>>(mut self, username: U, password: P) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// 设置认证数据库
    pub fn with_auth_source<A: Into<String>>(mut self, auth_source: A) -> Self {
        self.auth_source = Some(auth_source.into());
        self
    }

    /// 启用直接连接
    pub fn with_direct_connection(mut self, direct: bool) -> Self {
        self.direct_connection = direct;
        self
    }

    /// 添加自定义选项
    pub fn with_option<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// 数据库名
    pub fn database(&self) -> &str {
        &self.database
    }

    /// 生成MongoDB连接URI
    pub fn build_uri(&self) -> String {
        let mut uri = String::from("mongodb://");

        if let (Some(username), Some(password)) = (&self.username, &self.password) {
            uri.push_str(&urlencoding::encode(username));
            uri.push(':');
            uri.push_str(&urlencoding::encode(password));
            uri.push('@');
        }

        uri.push_str(&self.host);
        uri.push(':');
        uri.push_str(&self.port.to_string());

        uri.push('/');
        uri.push_str(&self.database);

        let mut params = Vec::new();

        if let Some(auth_source) = &self.auth_source {
            params.push(format!("authSource={}", urlencoding::encode(auth_source)));
        }

        if self.direct_connection {
            params.push("directConnection=true".to_string());
        }

        for (key, value) in &self.options {
            params.push(format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(value)
            ));
        }

        if !params.is_empty() {
            uri.push('?');
            uri.push_str(&params.join("&"));
        }

        uri
    }
}
