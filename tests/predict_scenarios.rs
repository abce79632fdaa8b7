use rxnpredict::{
    from_smiles, to_canonical_smiles, Canvas, PredictError, Predictor, RenderOptions,
    TemplateCatalog,
};

fn canonical(smiles: &str) -> String {
    to_canonical_smiles(&from_smiles(smiles).unwrap())
}

fn builtin() -> TemplateCatalog {
    TemplateCatalog::builtin()
}

#[test]
fn bromination_of_benzene_gives_bromobenzene() {
    let catalog = builtin();
    let products = Predictor::new(&catalog)
        .predict("c1ccccc1 + BrBr", "Bromination")
        .unwrap();
    assert!(products.contains(&canonical("Brc1ccccc1")));
    assert_eq!(products.len(), 1);
}

#[test]
fn single_reactant_for_bromination_is_count_mismatch() {
    let catalog = builtin();
    let err = Predictor::new(&catalog)
        .predict("c1ccccc1", "Bromination")
        .unwrap_err();
    assert_eq!(
        err,
        PredictError::ReactantCountMismatch {
            expected: 2,
            got: 1
        }
    );
    let message = err.to_string();
    assert!(message.contains('1') && message.contains('2'), "{message}");
}

#[test]
fn garbage_reactant_is_invalid_structure() {
    let catalog = builtin();
    let predictor = Predictor::new(&catalog);
    for name in ["Bromination", "Hydrolysis", "Decarboxylation"] {
        match predictor.predict("XYZ123notasmiles", name) {
            Err(PredictError::InvalidReactantStructure { position, text, .. }) => {
                assert_eq!(position, 1);
                assert_eq!(text, "XYZ123notasmiles");
            }
            other => panic!("{name}: unexpected {other:?}"),
        }
    }
}

#[test]
fn second_reactant_failure_names_second_reactant() {
    let catalog = builtin();
    let err = Predictor::new(&catalog)
        .predict("c1ccccc1 + Br(Br", "Bromination")
        .unwrap_err();
    assert!(matches!(
        err,
        PredictError::InvalidReactantStructure { position: 2, .. }
    ));
}

#[test]
fn invalid_template_syntax_wins_regardless_of_reactants() {
    let catalog = builtin();
    let predictor = Predictor::new(&catalog);
    for reactants in ["CC=O + C=P(C)(C)C", "XYZ123notasmiles", "C"] {
        assert!(matches!(
            predictor.predict(reactants, "Wittig Reaction"),
            Err(PredictError::InvalidTemplateSyntax { .. })
        ));
    }

    let custom = TemplateCatalog::from_entries([("Broken", "[C:1](=O>>[C:1]")]).unwrap();
    assert!(matches!(
        Predictor::new(&custom).predict("CC=O", "Broken"),
        Err(PredictError::InvalidTemplateSyntax { .. })
    ));
}

#[test]
fn aliphatic_input_for_aromatic_substitution_finds_nothing() {
    let catalog = builtin();
    assert_eq!(
        Predictor::new(&catalog)
            .predict("CCCCCC + BrBr", "Bromination")
            .unwrap_err(),
        PredictError::NoProductsFound
    );
}

#[test]
fn unknown_template_is_reported() {
    let catalog = builtin();
    let err = Predictor::new(&catalog)
        .predict("c1ccccc1 + BrBr", "bromination")
        .unwrap_err();
    assert_eq!(
        err,
        PredictError::UnknownTemplate {
            name: "bromination".to_owned()
        }
    );
}

#[test]
fn repeated_requests_are_identical() {
    let catalog = builtin();
    let predictor = Predictor::new(&catalog);
    let first = predictor.run("Cc1ccccc1 + ClCl", "Chlorination").unwrap();
    let second = predictor.run("Cc1ccccc1 + ClCl", "Chlorination").unwrap();
    assert_eq!(first, second);
    assert_eq!(first.products.len(), 3);
}

#[test]
fn run_renders_products_and_schematic() {
    let catalog = builtin();
    let prediction = Predictor::new(&catalog)
        .run("c1ccccc1 + BrBr", "Bromination")
        .unwrap();
    assert_eq!(prediction.reaction, "Bromination");
    assert_eq!(prediction.template, "[cH:1].[Br][Br]>>[c:1][Br]");
    assert_eq!(prediction.images.len(), 1);
    assert_eq!(prediction.images[0].depiction.width, 300);
    assert_eq!(prediction.images[0].depiction.height, 300);
    // Three panels of 400x200 with two gaps between them.
    assert!(prediction.schematic.width > 3 * 400);
    assert_eq!(prediction.schematic.height, 200);
}

#[test]
fn overvalent_product_is_invalid_generated_structure() {
    let catalog = builtin();
    let predictor = Predictor::new(&catalog);
    let reactants = "CC(=O)OC + CC(=O)OC";
    let products = predictor.predict(reactants, "Claisen Condensation").unwrap();
    assert_eq!(products.len(), 1);
    match predictor.run(reactants, "Claisen Condensation") {
        Err(PredictError::InvalidGeneratedStructure { smiles, .. }) => {
            assert!(products.contains(&smiles), "{smiles}");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn render_options_too_small_is_rendering_failure() {
    let catalog = builtin();
    let render = RenderOptions {
        molecule: Canvas::new(10, 10),
        ..RenderOptions::default()
    };
    let err = Predictor::new(&catalog)
        .with_render_options(render)
        .run("c1ccccc1 + BrBr", "Bromination")
        .unwrap_err();
    assert!(matches!(err, PredictError::RenderingFailure { .. }));
}

#[test]
fn template_schematic_for_every_parseable_template() {
    let catalog = builtin();
    let predictor = Predictor::new(&catalog);
    for name in catalog.names() {
        match predictor.render_template(name) {
            Ok(depiction) => assert!(depiction.svg.ends_with("</svg>"), "{name}"),
            Err(PredictError::InvalidTemplateSyntax { .. }) => assert_eq!(name, "Wittig Reaction"),
            Err(e) => panic!("{name}: {e}"),
        }
    }
}

#[test]
fn prediction_serialises_to_json() {
    let catalog = builtin();
    let prediction = Predictor::new(&catalog)
        .run("CC(=O)OC", "Hydrolysis")
        .unwrap();
    let value = serde_json::to_value(&prediction).unwrap();
    assert_eq!(value["reaction"], "Hydrolysis");
    assert_eq!(value["products"].as_array().unwrap().len(), 2);
    assert_eq!(value["images"].as_array().unwrap().len(), 2);
}
