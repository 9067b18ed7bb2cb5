//! `sample.Service1` contract: messages and a unary gRPC client.

use channel_hub::ServiceContract;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::Channel;

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetDataRequest {
    #[prost(int32, tag = "1")]
    pub value: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetDataResponse {
    #[prost(string, tag = "1")]
    pub data: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CompositeType {
    #[prost(bool, tag = "1")]
    pub bool_value: bool,
    #[prost(string, tag = "2")]
    pub string_value: String,
}

/// Client for `sample.Service1`. Each resolution yields a new instance.
#[derive(Clone)]
pub struct Service1Client {
    inner: tonic::client::Grpc<Channel>,
}

impl ServiceContract for Service1Client {
    const NAME: &'static str = "sample.Service1";

    fn from_channel(channel: Channel) -> Self {
        Self {
            inner: tonic::client::Grpc::new(channel),
        }
    }
}

impl Service1Client {
    async fn unary<Req, Resp>(
        &mut self,
        path: &'static str,
        request: Req,
    ) -> Result<Resp, tonic::Status>
    where
        Req: prost::Message + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static,
    {
        self.inner
            .ready()
            .await
            .map_err(|e| tonic::Status::unavailable(format!("service was not ready: {e}")))?;
        let codec = tonic_prost::ProstCodec::<Req, Resp>::default();
        let response = self
            .inner
            .unary(tonic::Request::new(request), PathAndQuery::from_static(path), codec)
            .await?;
        Ok(response.into_inner())
    }

    /// # Errors
    /// Returns the call's `tonic::Status`.
    pub async fn get_data(&mut self, value: i32) -> Result<String, tonic::Status> {
        let response: GetDataResponse = self
            .unary("/sample.Service1/GetData", GetDataRequest { value })
            .await?;
        Ok(response.data)
    }

    /// # Errors
    /// Returns the call's `tonic::Status`.
    pub async fn get_data_using_data_contract(
        &mut self,
        composite: CompositeType,
    ) -> Result<CompositeType, tonic::Status> {
        self.unary("/sample.Service1/GetDataUsingDataContract", composite)
            .await
    }
}
