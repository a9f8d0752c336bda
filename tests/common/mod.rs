#![allow(dead_code)]

use oasguard::middleware::{ApiRequest, ApiResponse};
use oasguard::spec::{load_spec_from_str, SpecDocument, SpecFormat};
use std::sync::Arc;

/// Cities API used across the integration tests.
pub const CITIES_SPEC: &str = r##"
openapi: 3.0.3
info:
  title: Cities
  version: "1.0.0"
paths:
  /cities:
    get:
      operationId: listCities
      parameters:
        - name: limit
          in: query
          schema:
            type: integer
        - name: verbose
          in: query
          schema:
            type: boolean
      responses:
        "200":
          description: ok
          content:
            application/json:
              schema:
                type: object
                required: [cities]
                properties:
                  cities:
                    type: array
                    items:
                      $ref: "#/components/schemas/city"
        default:
          $ref: "#/components/responses/Error"
    post:
      operationId: createCity
      requestBody:
        $ref: "#/components/requestBodies/CityBody"
      responses:
        "201":
          description: created
          content:
            application/json:
              schema:
                $ref: "#/components/schemas/city"
  /cities/{id}:
    parameters:
      - $ref: "#/components/parameters/CityId"
    get:
      operationId: getCity
      parameters:
        - name: X-Request-Id
          in: header
          required: true
          schema:
            type: string
      responses:
        "200":
          description: ok
          content:
            application/json:
              schema:
                $ref: "#/components/schemas/city"
        "404":
          description: missing
          content:
            application/json:
              schema:
                $ref: "#/components/schemas/error"
    delete:
      operationId: deleteCity
      responses:
        "204":
          description: deleted
components:
  parameters:
    CityId:
      name: id
      in: path
      required: true
      schema:
        type: integer
  requestBodies:
    CityBody:
      required: true
      content:
        application/json:
          schema:
            type: object
            required: [city]
            properties:
              city:
                $ref: "#/components/schemas/city"
  responses:
    Error:
      description: error
      content:
        application/json:
          schema:
            $ref: "#/components/schemas/error"
  schemas:
    city:
      type: object
      required: [name, latitude, longitude, demonym, website]
      properties:
        name:
          type: string
        latitude:
          type: number
        longitude:
          type: number
        demonym:
          type: string
        website:
          type: string
        population:
          type: integer
          nullable: true
    error:
      type: object
      required: [message]
      properties:
        message:
          type: string
"##;

pub fn cities_doc() -> Arc<SpecDocument> {
    Arc::new(load_spec_from_str(CITIES_SPEC, SpecFormat::Yaml).unwrap())
}

/// A complete Berlin record as JSON.
pub fn berlin() -> serde_json::Value {
    serde_json::json!({
        "name": "Berlin",
        "latitude": 52.52,
        "longitude": 13.405,
        "demonym": "Berliner",
        "website": "https://berlin.de"
    })
}

pub fn request(method: &str, uri: &str, body: &str) -> ApiRequest {
    http::Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.as_bytes().to_vec())
        .unwrap()
}

pub fn json_response(status: u16, body: &serde_json::Value) -> ApiResponse {
    http::Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(serde_json::to_vec(body).unwrap())
        .unwrap()
}

pub mod temp_files {
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Write `content` to a temporary file with the given extension.
    /// The file is removed when the returned handle drops.
    pub fn create_temp_spec(content: &str, ext: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .prefix("oasguard_test_")
            .suffix(&format!(".{ext}"))
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    pub fn create_temp_yaml(content: &str) -> NamedTempFile {
        create_temp_spec(content, "yaml")
    }

    pub fn create_temp_json(content: &str) -> NamedTempFile {
        create_temp_spec(content, "json")
    }
}
